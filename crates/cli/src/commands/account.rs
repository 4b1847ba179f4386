//! Account commands: signup and login.

use super::{CliError, signed_in_store};

/// Create an account and its customer profile, then sign in to confirm.
pub async fn signup(
    email: &str,
    password: &str,
    first: &str,
    last: &str,
) -> Result<(), CliError> {
    let config = beanpass_client::ClientConfig::from_env()?;
    let service = beanpass_client::remote::http::HttpAccountService::new(&config);
    let store = beanpass_client::ClientStore::new(service);
    store.initialize().await;

    store.sign_up(email, password, first, last).await?;
    tracing::info!(%email, "account created");

    login(email, password).await
}

/// Sign in and print the identity summary.
#[allow(clippy::print_stdout)]
pub async fn login(email: &str, password: &str) -> Result<(), CliError> {
    let store = signed_in_store(email, password).await?;
    let snapshot = store.snapshot();

    if let Some(profile) = snapshot.profile {
        println!("Signed in as {} <{}>", profile.display_name(), profile.email);
        println!("  Scan token: {}", profile.scan_token);
        println!("  Balance:    {}", profile.balance);
        println!("  Locations:  {}", snapshot.saved_locations.len());
    } else {
        println!("Signed in, but no customer profile exists yet.");
        println!("Complete profile setup before connecting to a location.");
    }

    store.shutdown();
    Ok(())
}
