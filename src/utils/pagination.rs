// Pagination commune à toutes les listes
//
// Deux conventions coexistent:
//   - limit/offset (matches, photos, pairs, messages)
//   - page/page_size (pets)
// Le total est toujours renvoyé dans le header X-Total-Count.

use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const TOTAL_COUNT_HEADER: &str = "X-Total-Count";
pub const MAX_LIMIT: u64 = 100;

/// Query string ?limit=&offset=
#[derive(Debug, Default, Deserialize)]
pub struct LimitOffset {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Fenêtre validée, prête pour .limit()/.offset()
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub limit: u64,
    pub offset: u64,
}

impl LimitOffset {
    pub fn window(&self, default_limit: u64) -> Result<Window, AppError> {
        let limit = match self.limit {
            None => default_limit,
            Some(l) if (1..=MAX_LIMIT as i64).contains(&l) => l as u64,
            Some(_) => {
                return Err(AppError::Unprocessable(format!(
                    "limit must be between 1 and {}",
                    MAX_LIMIT
                )));
            }
        };

        let offset = match self.offset {
            None => 0,
            Some(o) if o >= 0 => o as u64,
            Some(_) => return Err(AppError::Unprocessable("offset must be >= 0".to_string())),
        };

        Ok(Window { limit, offset })
    }
}

/// Query string ?page=&page_size=
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl PageQuery {
    pub fn window(&self) -> Result<Window, AppError> {
        let page = self.page.unwrap_or(1);
        if page < 1 {
            return Err(AppError::Unprocessable("page must be >= 1".to_string()));
        }

        let page_size = self.page_size.unwrap_or(20);
        if !(1..=MAX_LIMIT as i64).contains(&page_size) {
            return Err(AppError::Unprocessable(format!(
                "page_size must be between 1 and {}",
                MAX_LIMIT
            )));
        }

        let offset = (page - 1)
            .checked_mul(page_size)
            .ok_or_else(|| AppError::Unprocessable("page out of range".to_string()))?;

        Ok(Window {
            limit: page_size as u64,
            offset: offset as u64,
        })
    }
}

/// Réponse 200 avec la page en JSON et le total en header
pub fn paginated<T: Serialize>(items: &[T], total: u64) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((TOTAL_COUNT_HEADER, total.to_string()))
        .json(items)
}
