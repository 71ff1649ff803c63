//! forgelink binary entry point.

use forgelink::ui::output;

fn main() {
    if let Err(err) = forgelink::cli::run() {
        output::error(format!("{:#}", err));
        std::process::exit(1);
    }
}
