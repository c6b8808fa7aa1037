//! Saved-address commands.

use paratha_client::{Address, AddressDraft, App};
use paratha_core::AddressId;

use super::CommandError;

pub async fn list(app: &mut App) -> Result<(), CommandError> {
    let addresses = app.load_addresses().await?;
    if addresses.is_empty() {
        tracing::info!("No saved addresses");
    }
    for address in addresses {
        print_address(address);
    }
    Ok(())
}

pub async fn add(app: &mut App, draft: AddressDraft) -> Result<(), CommandError> {
    let address = app.add_address(draft).await?;
    print_address(&address);
    Ok(())
}

pub async fn remove(app: &mut App, id: &str) -> Result<(), CommandError> {
    app.delete_address(&AddressId::new(id)).await?;
    tracing::info!("Address {id} deleted");
    Ok(())
}

pub async fn set_default(app: &mut App, id: &str) -> Result<(), CommandError> {
    app.set_default_address(&AddressId::new(id)).await?;
    tracing::info!("Address {id} is now the default");
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_address(address: &Address) {
    let marker = if address.is_default { "*" } else { " " };
    println!(
        "{marker} {:<24} {:<5} {}, {}, {} {}",
        address.id.as_str(),
        address.kind.to_string(),
        address.address,
        address.city,
        address.state,
        address.zip_code
    );
}
