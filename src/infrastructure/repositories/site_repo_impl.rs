// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::site::Site;
use crate::domain::repositories::scan_repository::RepositoryError;
use crate::domain::repositories::site_repository::SiteRepository;
use crate::infrastructure::database::entities::site as site_entity;
use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use uuid::Uuid;

/// 站点仓库实现
#[derive(Clone)]
pub struct SiteRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl SiteRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<site_entity::Model> for Site {
    fn from(model: site_entity::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            url: model.url,
            sitemap_url: model.sitemap_url,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[async_trait]
impl SiteRepository for SiteRepositoryImpl {
    async fn create(&self, site: &Site) -> Result<Site, RepositoryError> {
        let model = site_entity::ActiveModel {
            id: Set(site.id),
            name: Set(site.name.clone()),
            url: Set(site.url.clone()),
            sitemap_url: Set(site.sitemap_url.clone()),
            created_at: Set(site.created_at),
            updated_at: Set(site.updated_at),
        };
        Ok(model.insert(self.db.as_ref()).await?.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Site>, RepositoryError> {
        let model = site_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Site>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = site_entity::Entity::find()
            .filter(site_entity::Column::Id.is_in(ids.iter().copied()))
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }
}
