use crate::domain;
use crate::domain::user::{NewUser, User};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::Context;
use sqlx::{FromRow, query_as};
use uuid::Uuid;

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
}

impl From<UserRow> for User {
    fn from(value: UserRow) -> Self {
        User {
            id: value.id,
            email: value.email,
            password_hash: value.password_hash,
        }
    }
}

pub struct DbUserReader;

impl domain::user::driven_ports::UserReader for DbUserReader {
    async fn user_by_email(
        &self,
        email: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<User>, anyhow::Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        let user = query_as::<_, UserRow>(
            "SELECT id, email, password_hash FROM app_user WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(cxn_handle.borrow_connection())
        .await
        .context("Fetching a user by email")?;

        Ok(user.map(User::from))
    }
}

pub struct DbUserWriter;

impl domain::user::driven_ports::UserWriter for DbUserWriter {
    async fn create_user(
        &self,
        user: &NewUser,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<User>, anyhow::Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        // The unique index on email decides races between concurrent registrations
        let created = query_as::<_, UserRow>(
            "INSERT INTO app_user(id, email, password_hash) VALUES ($1, $2, $3) \
             ON CONFLICT (email) DO NOTHING \
             RETURNING id, email, password_hash",
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_optional(cxn_handle.borrow_connection())
        .await
        .context("Inserting new user")?;

        Ok(created.map(User::from))
    }
}
