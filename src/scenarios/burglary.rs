use crate::network::{Net, NetworkResult, Node};

pub const TITLE: &str = "Burglary Alarm";

/// Pearl's alarm network: a burglary or an earthquake can set off the alarm,
/// and either neighbour may call when it rings.
///
/// Exact posterior for the usual diagnostic query:
/// `P(Burglary = T | JohnCalls = T, MaryCalls = T) = 0.284`.
pub fn build() -> NetworkResult<Net> {
    let mut net = Net::new(TITLE);
    let burglary = net.add_node(Node::with_states("Burglary", &["T", "F"]))?;
    let earthquake = net.add_node(Node::with_states("Earthquake", &["T", "F"]))?;
    let alarm = net.add_node(Node::with_states("Alarm", &["T", "F"]))?;
    let john = net.add_node(Node::with_states("JohnCalls", &["T", "F"]))?;
    let mary = net.add_node(Node::with_states("MaryCalls", &["T", "F"]))?;

    net.add_child(burglary, alarm);
    net.add_child(earthquake, alarm);
    net.add_child(alarm, john);
    net.add_child(alarm, mary);

    let start = net.node(burglary).first_combination(&net)?;
    net.fill_table(burglary, &start, &[0.001, 0.999])?;
    let start = net.node(earthquake).first_combination(&net)?;
    net.fill_table(earthquake, &start, &[0.002, 0.998])?;

    // (Burglary, Earthquake) = TT, TF, FT, FF for Alarm = T, then Alarm = F
    let start = net.node(alarm).first_combination(&net)?;
    net.fill_table(
        alarm,
        &start,
        &[0.95, 0.94, 0.29, 0.001, 0.05, 0.06, 0.71, 0.999],
    )?;

    // Alarm = T, F for calling, then for staying quiet
    let start = net.node(john).first_combination(&net)?;
    net.fill_table(john, &start, &[0.90, 0.05, 0.10, 0.95])?;
    let start = net.node(mary).first_combination(&net)?;
    net.fill_table(mary, &start, &[0.70, 0.01, 0.30, 0.99])?;

    Ok(net)
}
