use crate::{
    db::Store,
    error::AppResult,
    models::{category, Category, CategoryModel},
};
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};

pub struct CategoryService {
    store: Store,
}

impl CategoryService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> AppResult<Vec<CategoryModel>> {
        let categories = Category::find()
            .order_by_asc(category::Column::Name)
            .all(self.store.conn())
            .await?;
        Ok(categories)
    }

    /// Duplicate names surface as a unique-constraint error.
    pub async fn create(&self, name: &str) -> AppResult<CategoryModel> {
        let category = category::ActiveModel {
            name: Set(name.trim().to_string()),
            ..Default::default()
        }
        .insert(self.store.conn())
        .await?;
        Ok(category)
    }
}
