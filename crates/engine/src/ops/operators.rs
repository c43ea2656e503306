use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, prelude::*};

use crate::{EngineError, Operator, ResultEngine, operators};

impl super::Engine {
    /// Registers a back-office operator. Usernames are unique.
    pub async fn create_operator(
        &self,
        username: &str,
        password: &str,
        role: &str,
    ) -> ResultEngine<Operator> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(EngineError::InvalidValue(
                "username and password must not be empty".to_string(),
            ));
        }

        let operator = operators::ActiveModel {
            id: ActiveValue::NotSet,
            username: ActiveValue::Set(username.to_string()),
            password_hash: ActiveValue::Set(operators::password_hash(username, password)),
            role: ActiveValue::Set(role.to_string()),
            created_at: ActiveValue::Set(Utc::now()),
        }
        .insert(&self.database)
        .await
        .map_err(|err| EngineError::from_insert(err, username))?;

        tracing::info!(username, role, "operator created");
        Ok(Operator::from(operator))
    }

    /// Checks an operator's credentials, returning `None` when they do not
    /// match.
    pub async fn authenticate_operator(
        &self,
        username: &str,
        password: &str,
    ) -> ResultEngine<Option<Operator>> {
        let found = operators::Entity::find()
            .filter(operators::Column::Username.eq(username))
            .one(&self.database)
            .await?;

        Ok(found
            .filter(|operator| {
                operator.password_hash == operators::password_hash(username, password)
            })
            .map(Operator::from))
    }
}
