//! Saved-location commands: connect, list, set-home.

use super::{CliError, signed_in_store};

/// Connect the customer to a location by join code.
#[allow(clippy::print_stdout)]
pub async fn connect(email: &str, password: &str, code: &str) -> Result<(), CliError> {
    let store = signed_in_store(email, password).await?;
    let name = store.connect_location(code).await?;
    println!("Connected to {name}");

    store.shutdown();
    Ok(())
}

/// Print saved locations, home first.
#[allow(clippy::print_stdout)]
pub async fn list(email: &str, password: &str) -> Result<(), CliError> {
    let store = signed_in_store(email, password).await?;
    let snapshot = store.snapshot();

    if snapshot.saved_locations.is_empty() {
        println!("No saved locations. Connect with `beanpass location connect`.");
    } else {
        for (index, row) in snapshot.saved_locations.iter().enumerate() {
            let marker = if row.is_home { " (home)" } else { "" };
            let place = match (&row.location.city, &row.location.state) {
                (Some(city), Some(state)) => format!(" - {city}, {state}"),
                (Some(city), None) => format!(" - {city}"),
                _ => String::new(),
            };
            println!("{}. {}{place}{marker}", index + 1, row.location.name);
        }
    }

    store.shutdown();
    Ok(())
}

/// Promote the saved location at a 1-based list position to home.
#[allow(clippy::print_stdout)]
pub async fn set_home(email: &str, password: &str, position: usize) -> Result<(), CliError> {
    let store = signed_in_store(email, password).await?;
    let snapshot = store.snapshot();

    let row = position
        .checked_sub(1)
        .and_then(|index| snapshot.saved_locations.get(index))
        .ok_or(CliError::NoSuchPosition(position))?;

    let id = row.id;
    let name = row.location.name.clone();
    store.set_home_location(id).await?;
    println!("{name} is now your home location");

    store.shutdown();
    Ok(())
}
