use crate::network::{Net, NetworkResult, Node};

pub const TITLE: &str = "Grass Wetness Belief Net";

/// The textbook sprinkler network: `Cloudy -> {Sprinkler, Rain} -> GrassWet`,
/// every node boolean with states `T` then `F`.
///
/// Tables are filled in odometer order, where the last-added parent turns
/// fastest and the node's own state slowest.
pub fn build() -> NetworkResult<Net> {
    let mut net = Net::new(TITLE);
    let cloudy = net.add_node(Node::with_states("Cloudy", &["T", "F"]))?;
    let sprinkler = net.add_node(Node::with_states("Sprinkler", &["T", "F"]))?;
    let rain = net.add_node(Node::with_states("Rain", &["T", "F"]))?;
    let grass_wet = net.add_node(Node::with_states("GrassWet", &["T", "F"]))?;

    net.add_child(cloudy, sprinkler);
    net.add_child(cloudy, rain);
    net.add_child(sprinkler, grass_wet);
    net.add_child(rain, grass_wet);

    // Cloudy = T, F
    let start = net.node(cloudy).first_combination(&net)?;
    net.fill_table(cloudy, &start, &[0.5, 0.5])?;

    // (Cloudy, Sprinkler) = TT, FT, TF, FF
    let start = net.node(sprinkler).first_combination(&net)?;
    net.fill_table(sprinkler, &start, &[0.1, 0.5, 0.9, 0.5])?;

    // (Cloudy, Rain) = TT, FT, TF, FF
    let start = net.node(rain).first_combination(&net)?;
    net.fill_table(rain, &start, &[0.8, 0.2, 0.2, 0.8])?;

    // (Sprinkler, Rain, GrassWet) = TTT, TFT, FTT, FFT, TTF, TFF, FTF, FFF
    let start = net.node(grass_wet).first_combination(&net)?;
    net.fill_table(grass_wet, &start, &[0.99, 0.9, 0.9, 0.0, 0.01, 0.1, 0.1, 1.0])?;

    Ok(net)
}
