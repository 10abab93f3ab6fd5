//! `shellbuddy draft`: Show the latest drafted commit message.

use shellbuddy_config::Paths;

pub fn run(paths: Paths) -> Result<(), Box<dyn std::error::Error>> {
    match std::fs::read_to_string(paths.post_mortem()) {
        Ok(draft) => {
            println!("{}", draft.trim_end());
            Ok(())
        }
        Err(_) => Err("no commit draft yet, commit something while the daemon runs".into()),
    }
}
