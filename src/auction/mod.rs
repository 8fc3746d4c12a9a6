//! 경매 규칙 모듈
//! 입찰 수락 판정과 낙찰자 판정을 부수 효과 없는 순수 함수로 유지

// region:    --- Imports

use rust_decimal::Decimal;
use sqlx::FromRow;

// endregion: --- Imports

// region:    --- Bid State

/// 입찰 판정에 필요한 상품 스냅샷
#[derive(Debug, Clone, FromRow)]
pub struct BidState {
    pub listing_id: i64,
    pub seller_id: i64,
    pub starting_bid: Decimal,
    pub closed: bool,
    pub current_bid_id: Option<i64>,
    pub current_amount: Option<Decimal>,
}

// endregion: --- Bid State

// region:    --- Bid Rules

/// 입찰 거절 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidRejection {
    /// 종료된 경매
    Closed,
    /// 판매자 본인의 입찰
    SelfBid,
    /// 시작가 이하
    TooLow,
    /// 현재 입찰가 이하
    BelowCurrent,
}

/// 입찰 수락 판정
/// 시작가는 초과해야 하고, 현재 입찰이 있으면 그 금액도 초과해야 함
pub fn evaluate_bid(state: &BidState, bidder_id: i64, amount: Decimal) -> Result<(), BidRejection> {
    if state.closed {
        return Err(BidRejection::Closed);
    }
    if bidder_id == state.seller_id {
        return Err(BidRejection::SelfBid);
    }
    if amount <= state.starting_bid {
        return Err(BidRejection::TooLow);
    }
    if let Some(current) = state.current_amount {
        if amount <= current {
            return Err(BidRejection::BelowCurrent);
        }
    }
    Ok(())
}

/// 낙찰자 판정
/// 종료된 경매에서 현재 입찰자 본인이 조회할 때만 true
/// 현재 입찰이 없으면 항상 false
pub fn is_winner(
    viewer_id: Option<i64>,
    seller_id: i64,
    closed: bool,
    current_bidder_id: Option<i64>,
) -> bool {
    match (viewer_id, current_bidder_id) {
        (Some(viewer), Some(bidder)) => closed && viewer != seller_id && viewer == bidder,
        _ => false,
    }
}

// endregion: --- Bid Rules
