/// 전체 상품 목록 조회
pub const GET_ALL_LISTINGS: &str = r#"
    SELECT l.id, l.item, l.description, l.starting_bid,
           b.amount AS current_amount,
           c.name AS category,
           l.image_url,
           u.username AS seller,
           l.closed, l.created_at
    FROM listings l
    JOIN users u ON u.id = l.seller_id
    LEFT JOIN bids b ON b.id = l.current_bid_id
    LEFT JOIN categories c ON c.id = l.category_id
    ORDER BY l.created_at DESC
"#;

/// 카테고리별 상품 목록 조회
pub const GET_LISTINGS_BY_CATEGORY: &str = r#"
    SELECT l.id, l.item, l.description, l.starting_bid,
           b.amount AS current_amount,
           c.name AS category,
           l.image_url,
           u.username AS seller,
           l.closed, l.created_at
    FROM listings l
    JOIN users u ON u.id = l.seller_id
    JOIN categories c ON c.id = l.category_id
    LEFT JOIN bids b ON b.id = l.current_bid_id
    WHERE c.name = $1
    ORDER BY l.created_at DESC
"#;

/// 판매자별 상품 목록 조회
pub const GET_LISTINGS_BY_SELLER: &str = r#"
    SELECT l.id, l.item, l.description, l.starting_bid,
           b.amount AS current_amount,
           c.name AS category,
           l.image_url,
           u.username AS seller,
           l.closed, l.created_at
    FROM listings l
    JOIN users u ON u.id = l.seller_id
    LEFT JOIN bids b ON b.id = l.current_bid_id
    LEFT JOIN categories c ON c.id = l.category_id
    WHERE l.seller_id = $1
    ORDER BY l.created_at DESC
"#;

/// 관심 목록 상품 조회
pub const GET_WATCHED_LISTINGS: &str = r#"
    SELECT l.id, l.item, l.description, l.starting_bid,
           b.amount AS current_amount,
           c.name AS category,
           l.image_url,
           u.username AS seller,
           l.closed, l.created_at
    FROM listings l
    JOIN watchlist w ON w.listing_id = l.id
    JOIN users u ON u.id = l.seller_id
    LEFT JOIN bids b ON b.id = l.current_bid_id
    LEFT JOIN categories c ON c.id = l.category_id
    WHERE w.user_id = $1
    ORDER BY l.created_at DESC
"#;

/// 상품 상세 조회 (현재 입찰자 포함)
pub const GET_LISTING_DETAIL: &str = r#"
    SELECT l.id, l.item, l.description, l.starting_bid,
           b.amount AS current_amount,
           b.bidder_id AS current_bidder_id,
           bu.username AS current_bidder,
           c.name AS category,
           l.image_url,
           l.seller_id,
           u.username AS seller,
           l.closed, l.created_at
    FROM listings l
    JOIN users u ON u.id = l.seller_id
    LEFT JOIN bids b ON b.id = l.current_bid_id
    LEFT JOIN users bu ON bu.id = b.bidder_id
    LEFT JOIN categories c ON c.id = l.category_id
    WHERE l.id = $1
"#;

/// 상품 댓글 조회 (오래된 순)
pub const GET_LISTING_COMMENTS: &str = r#"
    SELECT c.id, c.listing_id, u.username AS author, c.body, c.created_at
    FROM comments c
    JOIN users u ON u.id = c.author_id
    WHERE c.listing_id = $1
    ORDER BY c.created_at ASC
"#;

/// 카테고리 목록 조회
pub const GET_CATEGORIES: &str = "SELECT id, name FROM categories ORDER BY id";

/// 카테고리 이름으로 id 조회
pub const GET_CATEGORY_ID: &str = "SELECT id FROM categories WHERE name = $1";

/// 관심 여부 조회
pub const IS_WATCHED: &str =
    "SELECT EXISTS(SELECT 1 FROM watchlist WHERE user_id = $1 AND listing_id = $2) AS watched";
