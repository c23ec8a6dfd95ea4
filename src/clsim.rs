mod cmd;

use clsim::MeasureError;

fn main() {
    let matches = cmd::make_command().get_matches();
    if let Err(err) = cmd::execute(&matches) {
        eprintln!("ERROR, {:#}", err);
        let code = match err.downcast_ref::<MeasureError>() {
            Some(
                MeasureError::InvalidInput(_)
                | MeasureError::EmptyCollection(_)
                | MeasureError::NodeBaseMismatch(_),
            ) => libc::EINVAL,
            _ => 1,
        };
        std::process::exit(code);
    }
}
