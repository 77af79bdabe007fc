use uuid::Uuid;

use crate::{
    config::Config,
    error::AppResult,
    models::{NewUser, Rol},
    store::Store,
    utils::hash_password,
};

pub const ADMIN_EMAIL: &str = "admin@admin.com";
pub const ADMIN_PASSWORD: &str = "admin123";
const ADMIN_NOMBRE: &str = "Admin Usuario";

/// Provisions the default administrator when no account uses its email.
pub async fn ensure_admin_user(store: &dyn Store, config: &Config) -> AppResult<()> {
    if store.find_user_by_email(ADMIN_EMAIL).await?.is_some() {
        return Ok(());
    }

    let password_hash = hash_password(ADMIN_PASSWORD, config.bcrypt_cost)?;
    store
        .insert_user(NewUser {
            id: Uuid::new_v4(),
            nombre: ADMIN_NOMBRE.to_string(),
            email: ADMIN_EMAIL.to_string(),
            password_hash,
            rol: Rol::Administrador,
            activo: true,
        })
        .await?;

    log::info!("Default administrator {} created", ADMIN_EMAIL);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn admin_is_created_once() {
        let store = MemoryStore::new();
        let config = Config::for_testing("secreto");

        ensure_admin_user(&store, &config).await.unwrap();
        ensure_admin_user(&store, &config).await.unwrap();

        let users = store.list_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].rol, Rol::Administrador);
        assert_eq!(users[0].nombre, "Admin Usuario");
    }
}
