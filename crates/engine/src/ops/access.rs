use sea_orm::{ConnectionTrait, QueryFilter, prelude::*};

use crate::{EngineError, ResultEngine, accounts, categories, transactions};

use super::Engine;

/// Generates a lookup restricted to the rows owned by one user.
///
/// Rows owned by someone else are indistinguishable from missing rows.
macro_rules! impl_owned_lookup {
    ($find_fn:ident, $entity:path, $model:path, $user_col:expr) => {
        pub(super) async fn $find_fn<C: ConnectionTrait>(
            &self,
            db: &C,
            user_id: i64,
            id: i64,
        ) -> ResultEngine<Option<$model>> {
            <$entity>::find_by_id(id)
                .filter($user_col.eq(user_id))
                .one(db)
                .await
                .map_err(Into::into)
        }
    };
}

impl Engine {
    impl_owned_lookup!(
        find_owned_account,
        accounts::Entity,
        accounts::Model,
        accounts::Column::UserId
    );

    impl_owned_lookup!(
        find_owned_transaction,
        transactions::Entity,
        transactions::Model,
        transactions::Column::UserId
    );

    /// Account referenced by a posting; `label` names the field in the error.
    pub(super) async fn require_account_reference<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: i64,
        account_id: i64,
        label: &str,
    ) -> ResultEngine<accounts::Model> {
        self.find_owned_account(db, user_id, account_id)
            .await?
            .ok_or_else(|| EngineError::InvalidReference(format!("invalid {label}")))
    }

    /// Category referenced by a transaction: owned by the caller or shared.
    pub(super) async fn require_category_reference<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: i64,
        category_id: i64,
    ) -> ResultEngine<categories::Model> {
        match self.find_visible_category(db, user_id, category_id).await? {
            Some(model) => Ok(model),
            None => Err(EngineError::InvalidReference(
                "invalid category".to_string(),
            )),
        }
    }

    pub(super) async fn require_account<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: i64,
        account_id: i64,
    ) -> ResultEngine<accounts::Model> {
        self.find_owned_account(db, user_id, account_id)
            .await?
            .ok_or_else(|| EngineError::NotFound("account".to_string()))
    }

    pub(super) async fn require_transaction<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: i64,
        transaction_id: i64,
    ) -> ResultEngine<transactions::Model> {
        self.find_owned_transaction(db, user_id, transaction_id)
            .await?
            .ok_or_else(|| EngineError::NotFound("transaction".to_string()))
    }

    async fn find_visible_category<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: i64,
        category_id: i64,
    ) -> ResultEngine<Option<categories::Model>> {
        let model = categories::Entity::find_by_id(category_id).one(db).await?;
        Ok(model.filter(|m| m.is_system || m.user_id.is_none() || m.user_id == Some(user_id)))
    }

    pub(super) async fn require_visible_category<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: i64,
        category_id: i64,
    ) -> ResultEngine<categories::Model> {
        self.find_visible_category(db, user_id, category_id)
            .await?
            .ok_or_else(|| EngineError::NotFound("category".to_string()))
    }

    /// Category the caller is about to modify or delete.
    ///
    /// System categories are read-only for everybody, including a user id
    /// recorded on the row.
    pub(super) async fn require_mutable_category<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: i64,
        category_id: i64,
        action: &str,
    ) -> ResultEngine<categories::Model> {
        let model = categories::Entity::find_by_id(category_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound("category".to_string()))?;
        if model.is_system || model.user_id.is_none() {
            return Err(EngineError::Forbidden(format!(
                "system categories cannot be {action}"
            )));
        }
        if model.user_id != Some(user_id) {
            return Err(EngineError::Forbidden(format!(
                "category belongs to another user and cannot be {action}"
            )));
        }
        Ok(model)
    }
}
