//! 데이터베이스 연결과 기동 부트스트랩 관리

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

// 연결 풀 크기
const MAX_CONNECTIONS: u32 = 5;

// 기동 시 순서대로 실행되는 부트스트랩 SQL
// 스키마 재생성 후 기본 카테고리를 시드함
const BOOTSTRAP_SQL: [&str; 3] = [
    include_str!("../sql/00-recreate-db.sql"),
    include_str!("../sql/01-create-schema.sql"),
    include_str!("../sql/02-seed-categories.sql"),
];

pub struct DatabaseManager {
    pool: Arc<PgPool>,
}

impl DatabaseManager {
    /// 데이터베이스 매니저 생성
    pub async fn new() -> Self {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(&database_url)
            .await
            .expect("Failed to create pool");
        Self {
            pool: Arc::new(pool),
        }
    }

    /// 데이터베이스 풀 가져오기
    pub fn get_pool(&self) -> Arc<PgPool> {
        Arc::clone(&self.pool)
    }

    /// 트랜잭션 실행 (클로저가 Err 를 반환하면 롤백)
    pub async fn transaction<F, R, E>(&self, f: F) -> Result<R, E>
    where
        F: for<'c> FnOnce(
            &'c mut sqlx::Transaction<'_, sqlx::Postgres>,
        ) -> Pin<Box<dyn Future<Output = Result<R, E>> + Send + 'c>>,
        E: From<sqlx::Error>,
    {
        let mut tx = self.pool.begin().await?;
        let result = f(&mut tx).await;
        match result {
            Ok(r) => {
                tx.commit().await?;
                Ok(r)
            }
            Err(e) => {
                tx.rollback().await?;
                Err(e)
            }
        }
    }

    /// 데이터베이스 초기화
    pub async fn initialize_database(&self) -> Result<(), sqlx::Error> {
        for sql in BOOTSTRAP_SQL {
            self.execute_batch(sql).await?;
        }
        Ok(())
    }

    /// 세미콜론으로 구분된 여러 문장 실행
    async fn execute_batch(&self, sql: &str) -> Result<(), sqlx::Error> {
        for statement in sql.split(';') {
            let statement = statement.trim();
            if !statement.is_empty() {
                sqlx::query(statement).execute(&*self.pool).await?;
            }
        }
        Ok(())
    }
}
