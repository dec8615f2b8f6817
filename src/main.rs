use anyhow::{Context, Result};
use beliefnet::common::report::render_posterior;
use beliefnet::common::{init_logging, parse_configuration_options, NetworkSource};
use beliefnet::scenarios::scenario_by_name;
use beliefnet::{NetDocument, NetworkStore};
use log::info;

fn main() -> Result<()> {
    init_logging("info");
    let options = parse_configuration_options()?;

    let mut net = match &options.source {
        NetworkSource::File(path) => NetDocument::load(path)?.into_net()?,
        NetworkSource::Scenario(name) => scenario_by_name(name)?,
        NetworkSource::Database { db_path, title } => NetworkStore::new(db_path)?
            .load_net(title)?
            .with_context(|| format!("No network titled '{}' in {}", title, db_path))?,
    };
    info!("Loaded '{}' with {} nodes", net.title(), net.len());

    net.set_config(options.inference_config());
    net.set_evidence(options.evidence.clone());

    let result = net.query_node(&options.query)?;
    println!("{}", render_posterior(&options.query, net.evidence(), &result));

    if options.save {
        if let Some(db_path) = &options.db_path {
            let store = NetworkStore::new(db_path)?;
            store.save_net(&net)?;
            let record = store.record_query(&net, &options.query, &result)?;
            info!("Stored '{}' and logged query {}", net.title(), record.id);
        }
    }

    Ok(())
}
