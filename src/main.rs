use clap::Parser;
use herd_immunity::error;
use herd_immunity::runner::{run_with_args, BaseArgs};

fn main() {
    let args = BaseArgs::parse();
    match run_with_args(&args) {
        Ok(steps) => println!("The simulation has ended after {steps} turns."),
        Err(e) => {
            error!("simulation failed: {e}");
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
