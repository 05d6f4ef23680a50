//! Onboarding of external secret-store scopes (§4.10): keeps the secret
//! store's environment/team/application scopes in sync with the object
//! store as Teams and Applications are created and deleted, so `rotate()`
//! can gate on a scope actually existing.

use crate::errors::Result;
use crate::secrets::SecretStore;

pub async fn onboard_environment(secrets: &dyn SecretStore, environment: &str) -> Result<()> {
    secrets.upsert_environment(environment).await
}

pub async fn offboard_environment(secrets: &dyn SecretStore, environment: &str) -> Result<()> {
    secrets.delete_environment(environment).await
}

pub async fn onboard_team(secrets: &dyn SecretStore, environment: &str, team: &str) -> Result<()> {
    secrets.upsert_team(environment, team).await
}

pub async fn offboard_team(secrets: &dyn SecretStore, environment: &str, team: &str) -> Result<()> {
    secrets.delete_team(environment, team).await
}

pub async fn onboard_application(secrets: &dyn SecretStore, environment: &str, team: &str, application: &str) -> Result<()> {
    secrets.upsert_application(environment, team, application).await
}

pub async fn offboard_application(secrets: &dyn SecretStore, environment: &str, team: &str, application: &str) -> Result<()> {
    secrets.delete_application(environment, team, application).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::MemorySecretStore;

    #[tokio::test]
    async fn onboarding_application_enables_client_secret_rotation() {
        let secrets = MemorySecretStore::new();
        onboard_environment(&secrets, "test").await.unwrap();
        onboard_team(&secrets, "test", "checkout").await.unwrap();
        onboard_application(&secrets, "test", "checkout", "app1").await.unwrap();
        let reference = crate::secrets::SecretRef::new("test", "checkout", "app1", "clientSecret", 1);
        assert!(secrets.rotate(&reference).await.is_ok());
    }
}
