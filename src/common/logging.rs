use env_logger::{Builder, Env};
use std::io::Write;

/// Installs the global logger, honouring `RUST_LOG` and falling back to
/// `default_filter`. Lines read `LEVEL [file:line] message`.
pub fn init_logging(default_filter: &str) {
    let _ = Builder::from_env(Env::default().default_filter_or(default_filter))
        .format(|buf, record| {
            let file = record.file().unwrap_or("unknown");
            let line = record.line().unwrap_or(0);
            writeln!(
                buf,
                "{} [{}:{}] {}",
                record.level(),
                file,
                line,
                record.args()
            )
        })
        .try_init();
}
