// region:    --- Imports
use super::queries;
use crate::bidding::model::{Category, Comment, ListingDetail, ListingSummary};
use crate::database::DatabaseManager;
use sqlx::Error as SqlxError;
use sqlx::Row;
use tracing::info;

// endregion: --- Imports

// region:    --- Query Handlers

/// 전체 상품 목록 조회
pub async fn get_all_listings(
    db_manager: &DatabaseManager,
) -> Result<Vec<ListingSummary>, SqlxError> {
    info!("{:<12} --> 전체 상품 목록 조회", "Query");
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, ListingSummary>(queries::GET_ALL_LISTINGS)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 카테고리별 상품 목록 조회
pub async fn get_listings_by_category(
    db_manager: &DatabaseManager,
    category: &str,
) -> Result<Vec<ListingSummary>, SqlxError> {
    info!("{:<12} --> 카테고리별 상품 조회: {}", "Query", category);
    let category = category.to_owned();
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, ListingSummary>(queries::GET_LISTINGS_BY_CATEGORY)
                    .bind(category)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 판매자별 상품 목록 조회
pub async fn get_listings_by_seller(
    db_manager: &DatabaseManager,
    seller_id: i64,
) -> Result<Vec<ListingSummary>, SqlxError> {
    info!("{:<12} --> 판매자별 상품 조회 id: {}", "Query", seller_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, ListingSummary>(queries::GET_LISTINGS_BY_SELLER)
                    .bind(seller_id)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 관심 목록 상품 조회
pub async fn get_watched_listings(
    db_manager: &DatabaseManager,
    user_id: i64,
) -> Result<Vec<ListingSummary>, SqlxError> {
    info!("{:<12} --> 관심 목록 조회 user: {}", "Query", user_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, ListingSummary>(queries::GET_WATCHED_LISTINGS)
                    .bind(user_id)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 상품 상세 조회
pub async fn get_listing_detail(
    db_manager: &DatabaseManager,
    listing_id: i64,
) -> Result<Option<ListingDetail>, SqlxError> {
    info!("{:<12} --> 상품 상세 조회 id: {}", "Query", listing_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, ListingDetail>(queries::GET_LISTING_DETAIL)
                    .bind(listing_id)
                    .fetch_optional(&mut **tx)
                    .await
            })
        })
        .await
}

/// 상품 댓글 조회
pub async fn get_listing_comments(
    db_manager: &DatabaseManager,
    listing_id: i64,
) -> Result<Vec<Comment>, SqlxError> {
    info!("{:<12} --> 상품 댓글 조회 id: {}", "Query", listing_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Comment>(queries::GET_LISTING_COMMENTS)
                    .bind(listing_id)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 카테고리 목록 조회
pub async fn get_categories(db_manager: &DatabaseManager) -> Result<Vec<Category>, SqlxError> {
    info!("{:<12} --> 카테고리 목록 조회", "Query");
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Category>(queries::GET_CATEGORIES)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 카테고리 이름으로 id 조회
pub async fn get_category_id(
    db_manager: &DatabaseManager,
    name: &str,
) -> Result<Option<i64>, SqlxError> {
    info!("{:<12} --> 카테고리 id 조회: {}", "Query", name);
    let name = name.to_owned();
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_scalar::<_, i64>(queries::GET_CATEGORY_ID)
                    .bind(name)
                    .fetch_optional(&mut **tx)
                    .await
            })
        })
        .await
}

/// 관심 여부 조회
pub async fn is_watched(
    db_manager: &DatabaseManager,
    user_id: i64,
    listing_id: i64,
) -> Result<bool, SqlxError> {
    info!(
        "{:<12} --> 관심 여부 조회 user: {} listing: {}",
        "Query", user_id, listing_id
    );
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let result = sqlx::query(queries::IS_WATCHED)
                    .bind(user_id)
                    .bind(listing_id)
                    .fetch_one(&mut **tx)
                    .await?;

                Ok(result.get("watched"))
            })
        })
        .await
}

// endregion: --- Query Handlers
