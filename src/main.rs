use std::process::ExitCode;

fn main() -> ExitCode {
    bib_tfrecord::logging::init_tracing();

    match bib_tfrecord::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
