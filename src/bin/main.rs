use keyslot::console::{reader, Console, Flow};
use std::io;
use tracing_chrome::{ChromeLayerBuilder, FlushGuard};
use tracing_subscriber::{prelude::*, EnvFilter};

fn init_tracing() -> Option<FlushGuard> {
    let filter = EnvFilter::try_from_env("KEYSLOT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt = tracing_subscriber::fmt::layer().with_writer(io::stderr);
    let registry = tracing_subscriber::registry().with(filter).with(fmt);
    match std::env::var("KEYSLOT_TRACE") {
        Ok(path) => {
            let (chrome, guard) = ChromeLayerBuilder::new().file(path).build();
            registry.with(chrome).init();
            Some(guard)
        }
        Err(_) => {
            registry.init();
            None
        }
    }
}

fn main() -> io::Result<()> {
    let _guard = init_tracing();
    let mut console = Console::new(io::stdout());
    let mut buffer = String::new();
    loop {
        if io::stdin().read_line(&mut buffer)? == 0 {
            break;
        }
        match reader::read_command_line(&buffer, &mut console) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(e) => eprintln!("{e}"),
        }
        buffer.clear();
    }
    Ok(())
}
