use anyhow::Result;
use beliefnet::common::init_logging;
use beliefnet::common::report::render_posterior;
use beliefnet::network::{InferenceConfig, InferenceMode};
use beliefnet::scenarios::grass_wetness;
use beliefnet::Event;
use log::info;

fn main() -> Result<()> {
    init_logging("info");

    let mut net = grass_wetness::build()?;
    net.set_evidence(Event::from_iter([("Sprinkler", "F"), ("Rain", "T")]));

    for mode in [
        InferenceMode::MarkovChainMonteCarlo,
        InferenceMode::RejectionSampling,
        InferenceMode::LikelihoodWeighting,
    ] {
        net.set_config(InferenceConfig::default().with_mode(mode).with_seed(7));
        let result = net.query_node("GrassWet")?;
        info!("{} sampling done", mode);
        println!("{}\n", render_posterior("GrassWet", net.evidence(), &result));
    }

    Ok(())
}
