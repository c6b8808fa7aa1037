//! Account commands: login, registration, profile and logout.

use paratha_client::api::{BusinessSignup, CustomerSignup, DeliverySignup, ProfileUpdate};
use paratha_client::{App, SessionError, User};
use secrecy::SecretString;

use super::CommandError;

/// Fields shared by every registration form.
pub struct Signup {
    pub name: String,
    pub email: String,
    pub password: SecretString,
    pub phone: String,
    pub address: String,
}

pub async fn login(app: &App, email: &str, password: SecretString) -> Result<(), CommandError> {
    let user = app.session().login(email, password).await?;
    tracing::info!(
        "Signed in as {} ({}); next screen: {}",
        user.email,
        user.role,
        app.session().landing_route()
    );
    Ok(())
}

pub async fn register_customer(app: &App, signup: Signup) -> Result<(), CommandError> {
    let form = CustomerSignup {
        name: signup.name,
        email: signup.email,
        password: signup.password,
        phone: signup.phone,
        address: signup.address,
    };
    let user = app.session().register_customer(&form).await?;
    tracing::info!("Customer account created for {}", user.email);
    Ok(())
}

pub async fn register_business(
    app: &App,
    signup: Signup,
    business_name: String,
    gst_number: String,
) -> Result<(), CommandError> {
    let form = BusinessSignup {
        name: signup.name,
        email: signup.email,
        password: signup.password,
        phone: signup.phone,
        address: signup.address,
        business_name,
        gst_number,
    };
    let user = app.session().register_business(&form).await?;
    tracing::info!("Business account created for {}", user.email);
    Ok(())
}

pub async fn register_delivery(
    app: &App,
    signup: Signup,
    vehicle_type: String,
    license_number: String,
) -> Result<(), CommandError> {
    let form = DeliverySignup {
        name: signup.name,
        email: signup.email,
        password: signup.password,
        phone: signup.phone,
        address: signup.address,
        vehicle_type,
        license_number,
    };
    let user = app.session().register_delivery(&form).await?;
    tracing::info!("Delivery partner account created for {}", user.email);
    Ok(())
}

pub async fn logout(app: &mut App) -> Result<(), CommandError> {
    let route = app.logout().await?;
    tracing::info!("Signed out; next screen: {route}");
    Ok(())
}

pub fn whoami(app: &App) -> Result<(), CommandError> {
    let state = app.session().state();
    let user = state.user.ok_or(SessionError::NotAuthenticated)?;
    print_user(&user)
}

pub async fn show_profile(app: &App) -> Result<(), CommandError> {
    let user = app.session().get_profile().await?;
    print_user(&user)
}

pub async fn update_profile(
    app: &App,
    name: Option<String>,
    phone: Option<String>,
    address: Option<String>,
) -> Result<(), CommandError> {
    let update = ProfileUpdate {
        name,
        phone,
        address,
        ..ProfileUpdate::default()
    };
    if update.is_empty() {
        tracing::warn!("Nothing to update");
        return Ok(());
    }
    let user = app.session().update_profile(&update).await?;
    print_user(&user)
}

pub async fn change_password(
    app: &App,
    current: SecretString,
    new: SecretString,
) -> Result<(), CommandError> {
    let message = app.session().change_password(current, new).await?;
    tracing::info!("{}", message.as_deref().unwrap_or("Password changed"));
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_user(user: &User) -> Result<(), CommandError> {
    println!("{}", serde_json::to_string_pretty(user)?);
    Ok(())
}
