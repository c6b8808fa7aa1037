//! Admin user-management commands.

use paratha_client::App;
use paratha_client::api::AdminUser;
use paratha_core::{Role, UserId};

use super::CommandError;

pub async fn list(app: &mut App) -> Result<(), CommandError> {
    let users = app.load_users().await?;
    if users.is_empty() {
        tracing::info!("No users");
    }
    for user in users {
        print_user(user);
    }
    let page = app.admin().pagination();
    tracing::info!(
        "Page {} of {} ({} users)",
        page.current_page,
        page.total_pages,
        page.total_users
    );
    Ok(())
}

pub async fn set_role(app: &mut App, id: &str, role: Role) -> Result<(), CommandError> {
    let user = app.update_user_role(&UserId::new(id), role).await?;
    print_user(&user);
    Ok(())
}

pub async fn remove(app: &mut App, id: &str) -> Result<(), CommandError> {
    app.delete_user(&UserId::new(id)).await?;
    tracing::info!("User {id} deleted");
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_user(user: &AdminUser) {
    let role = user.role.map_or("-", |role| role.as_str());
    println!(
        "{:<24} {:<9} {:<24} {}",
        user.id.as_str(),
        role,
        user.email.as_str(),
        user.name
    );
}
