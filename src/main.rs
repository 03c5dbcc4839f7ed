use bmcctl::cli;
use bmcctl::credentials::CredentialError;
use bmcctl::login::LoginError;
use bmcctl::target::TargetError;
use log::LevelFilter;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info)
        .init();

    if let Err(err) = cli::run().await {
        eprintln!("bmcctl: {err:#}");
        std::process::exit(exit_code(&err));
    }
}

/// Distinguished exit codes per failure kind, for scripting around the CLI.
fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(target) = err.downcast_ref::<TargetError>() {
        return match target {
            TargetError::MissingCredentials => 3,
            TargetError::VnicCredentialsRequired => 4,
        };
    }
    if err.downcast_ref::<CredentialError>().is_some() {
        return 5;
    }
    if let Some(login) = err.downcast_ref::<LoginError>() {
        return match login {
            LoginError::PathUnavailable => 6,
            LoginError::InstanceNotFound { .. } => 7,
        };
    }
    1
}
