//! 입찰 관련 커맨드 처리
//! 1. 입찰
//! 2. 경매 종료

// region:    --- Imports
use crate::auction::{evaluate_bid, BidRejection};
use crate::errors::ApiError;
use crate::listing_store::{BidOutcome, ListingStore};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
// endregion: --- Imports

// region:    --- Commands
/// 입찰 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaceBidCommand {
    pub listing_id: i64,
    pub bidder_id: i64,
    pub amount: Decimal,
}

/// 경매 종료 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CloseAuctionCommand {
    pub listing_id: i64,
    pub requester_id: i64,
}

// 최대 재시도 횟수
const MAX_RETRIES: i32 = 100;

/// 1. 입찰
/// 스냅샷으로 판정한 뒤 조건부 갱신, 경합이 감지되면 새 스냅샷으로 재시도
pub async fn handle_place_bid(
    cmd: PlaceBidCommand,
    store: &impl ListingStore,
) -> Result<i64, ApiError> {
    info!("{:<12} --> 입찰 요청 처리 시작: {:?}", "Command", cmd);
    let mut retries = 0;

    while retries < MAX_RETRIES {
        // 현재 스냅샷 조회
        let state = store
            .bid_state(cmd.listing_id)
            .await?
            .ok_or(ApiError::NotFound)?;

        // 입찰 수락 판정
        evaluate_bid(&state, cmd.bidder_id, cmd.amount).map_err(|rejection| match rejection {
            BidRejection::Closed => ApiError::AuctionClosed,
            BidRejection::SelfBid => ApiError::SelfBid,
            BidRejection::TooLow => ApiError::BidTooLow,
            BidRejection::BelowCurrent => ApiError::BidBelowCurrent,
        })?;

        // 스냅샷 기준 조건부 기록
        match store
            .append_bid(
                cmd.listing_id,
                cmd.bidder_id,
                cmd.amount,
                state.current_bid_id,
            )
            .await?
        {
            BidOutcome::Applied { bid_id } => {
                info!("{:<12} --> 입찰 성공: bid {}", "Command", bid_id);
                return Ok(bid_id);
            }
            BidOutcome::Conflict => {
                warn!(
                    "{:<12} --> 낙관적 갱신으로 인한 입찰 충돌: 재시도",
                    "Command"
                );
                retries += 1;
                continue;
            }
        }
    }

    Err(ApiError::MaxRetriesExceeded)
}

/// 2. 경매 종료
/// 판매자 본인만 종료 가능, 이미 종료된 경매는 멱등 처리
pub async fn handle_close_auction(
    cmd: CloseAuctionCommand,
    store: &impl ListingStore,
) -> Result<(), ApiError> {
    info!("{:<12} --> 경매 종료 요청 처리 시작: {:?}", "Command", cmd);

    let state = store
        .bid_state(cmd.listing_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    if cmd.requester_id != state.seller_id {
        return Err(ApiError::NotSeller);
    }

    if state.closed {
        return Ok(());
    }

    store.mark_closed(cmd.listing_id).await?;
    Ok(())
}

// endregion: --- Commands
