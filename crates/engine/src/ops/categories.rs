use chrono::Utc;
use sea_orm::{ActiveValue, Condition, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    Category, CategoryPatch, CategoryType, NewCategory, ResultEngine, categories,
};

use super::{Engine, normalize_optional_text, normalize_required_name, with_tx};

const MAX_CATEGORY_NAME_LEN: usize = 50;

impl Engine {
    /// Creates a category owned by `user_id`.
    pub async fn create_category(&self, user_id: i64, cmd: NewCategory) -> ResultEngine<Category> {
        with_tx!(self, "create category", |db_tx| {
            self.insert_category(&db_tx, Some(user_id), cmd).await
        })
    }

    /// Creates a shared, read-only category visible to every user.
    pub async fn create_system_category(&self, cmd: NewCategory) -> ResultEngine<Category> {
        with_tx!(self, "create system category", |db_tx| {
            self.insert_category(&db_tx, None, cmd).await
        })
    }

    async fn insert_category<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: Option<i64>,
        cmd: NewCategory,
    ) -> ResultEngine<Category> {
        let name = normalize_required_name(&cmd.name, "category", MAX_CATEGORY_NAME_LEN)?;
        let now = Utc::now();
        let model = categories::ActiveModel {
            id: ActiveValue::NotSet,
            user_id: ActiveValue::Set(user_id),
            kind: ActiveValue::Set(cmd.kind.as_str().to_string()),
            name: ActiveValue::Set(name),
            icon: ActiveValue::Set(normalize_optional_text(cmd.icon.as_deref())),
            color: ActiveValue::Set(normalize_optional_text(cmd.color.as_deref())),
            display_order: ActiveValue::Set(cmd.display_order),
            is_system: ActiveValue::Set(user_id.is_none()),
            is_active: ActiveValue::Set(true),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        }
        .insert(db)
        .await?;
        Category::try_from(model)
    }

    /// The user's own categories plus the system ones, optionally restricted
    /// to one type. Inactive categories are hidden.
    pub async fn categories(
        &self,
        user_id: i64,
        kind: Option<CategoryType>,
    ) -> ResultEngine<Vec<Category>> {
        let visible = Condition::any()
            .add(categories::Column::UserId.eq(user_id))
            .add(categories::Column::IsSystem.eq(true))
            .add(categories::Column::UserId.is_null());
        self.list_categories("list categories", visible, kind).await
    }

    /// System categories, optionally restricted to one type.
    pub async fn system_categories(
        &self,
        kind: Option<CategoryType>,
    ) -> ResultEngine<Vec<Category>> {
        let system = Condition::all().add(categories::Column::IsSystem.eq(true));
        self.list_categories("list system categories", system, kind)
            .await
    }

    async fn list_categories(
        &self,
        operation: &'static str,
        scope: Condition,
        kind: Option<CategoryType>,
    ) -> ResultEngine<Vec<Category>> {
        let mut query = categories::Entity::find()
            .filter(scope)
            .filter(categories::Column::IsActive.eq(true));
        if let Some(kind) = kind {
            query = query.filter(categories::Column::Kind.eq(kind.as_str()));
        }
        let models = query
            .order_by_asc(categories::Column::DisplayOrder)
            .order_by_asc(categories::Column::Id)
            .all(&self.database)
            .await
            .map_err(|err| crate::EngineError::from(err).during(operation))?;
        models.into_iter().map(Category::try_from).collect()
    }

    /// A category the user may see: their own or a system one.
    pub async fn category(&self, user_id: i64, category_id: i64) -> ResultEngine<Category> {
        with_tx!(self, "get category", |db_tx| {
            let model = self
                .require_visible_category(&db_tx, user_id, category_id)
                .await?;
            Category::try_from(model)
        })
    }

    /// Updates one of the caller's own categories.
    pub async fn update_category(
        &self,
        user_id: i64,
        category_id: i64,
        patch: CategoryPatch,
    ) -> ResultEngine<Category> {
        let name = patch
            .name
            .as_deref()
            .map(|name| normalize_required_name(name, "category", MAX_CATEGORY_NAME_LEN))
            .transpose()?;
        with_tx!(self, "update category", |db_tx| {
            self.require_mutable_category(&db_tx, user_id, category_id, "modified")
                .await?;

            let mut active = categories::ActiveModel {
                id: ActiveValue::Set(category_id),
                updated_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            };
            if let Some(name) = name {
                active.name = ActiveValue::Set(name);
            }
            if let Some(icon) = patch.icon.as_deref() {
                active.icon = ActiveValue::Set(normalize_optional_text(Some(icon)));
            }
            if let Some(color) = patch.color.as_deref() {
                active.color = ActiveValue::Set(normalize_optional_text(Some(color)));
            }
            if let Some(order) = patch.display_order {
                active.display_order = ActiveValue::Set(order);
            }
            if let Some(is_active) = patch.is_active {
                active.is_active = ActiveValue::Set(is_active);
            }
            let model = active.update(&db_tx).await?;
            Category::try_from(model)
        })
    }

    /// Removes one of the caller's own categories.
    ///
    /// Transactions pointing at it keep their row; the reference is cleared.
    pub async fn delete_category(&self, user_id: i64, category_id: i64) -> ResultEngine<()> {
        with_tx!(self, "delete category", |db_tx| {
            self.require_mutable_category(&db_tx, user_id, category_id, "deleted")
                .await?;
            categories::Entity::delete_by_id(category_id)
                .exec(&db_tx)
                .await?;
            tracing::info!(category_id, user_id, "category deleted");
            Ok(())
        })
    }
}
