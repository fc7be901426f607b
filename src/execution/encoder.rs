//! Encoders: build outgoing order-entry messages from an [`OrderRequest`].
//! Mirrors the JSON shape the decoder reads execution reports back in,
//! so a round-trip against a test venue stub is legible.

use crate::core::types::PositionSide;
use crate::execution::order_manager::OrderRequest;
use serde_json::json;

fn position_side_str(position_side: PositionSide) -> &'static str {
    match position_side {
        PositionSide::Long => "LONG",
        PositionSide::Short => "SHORT",
        PositionSide::Both => "BOTH",
    }
}

/// Render one outbound request as a JSON order-entry frame.
pub fn encode_json(request: &OrderRequest) -> String {
    let value = match *request {
        OrderRequest::New {
            ticker,
            side,
            position_side,
            price,
            qty,
            cl_order_id,
        } => json!({
            "type": "NEW",
            "symbol": ticker.as_str(),
            "side": format!("{:?}", side).to_uppercase(),
            "positionSide": position_side_str(position_side),
            "price": price.to_double(),
            "quantity": qty.to_double(),
            "newClientOrderId": cl_order_id.raw(),
        }),
        OrderRequest::Replace {
            ticker,
            side,
            position_side,
            old_id,
            new_id,
            price,
            qty,
            last_qty: _,
        } => json!({
            "type": "CANCEL_REPLACE",
            "symbol": ticker.as_str(),
            "side": format!("{:?}", side).to_uppercase(),
            "positionSide": position_side_str(position_side),
            "cancelOrigClientOrderId": old_id.raw(),
            "newClientOrderId": new_id.raw(),
            "price": price.to_double(),
            "quantity": qty.to_double(),
        }),
        OrderRequest::Cancel {
            ticker,
            side,
            position_side,
            cl_order_id,
        } => json!({
            "type": "CANCEL",
            "symbol": ticker.as_str(),
            "side": format!("{:?}", side).to_uppercase(),
            "positionSide": position_side_str(position_side),
            "origClientOrderId": cl_order_id.raw(),
        }),
    };
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{OrderId, Price, Qty, Side, TickerId};

    #[test]
    fn encodes_new_order_with_expected_fields() {
        let req = OrderRequest::New {
            ticker: TickerId::new("BTCUSDT"),
            side: Side::Buy,
            position_side: PositionSide::Both,
            price: Price::from_double(100.0),
            qty: Qty::from_double(1.0),
            cl_order_id: OrderId::from_nanos(42),
        };
        let json_str = encode_json(&req);
        assert!(json_str.contains("\"type\":\"NEW\""));
        assert!(json_str.contains("\"symbol\":\"BTCUSDT\""));
        assert!(json_str.contains("\"newClientOrderId\":42"));
    }

    #[test]
    fn encodes_cancel_replace_with_both_ids() {
        let req = OrderRequest::Replace {
            ticker: TickerId::new("ETHUSDT"),
            side: Side::Sell,
            position_side: PositionSide::Short,
            old_id: OrderId::from_nanos(10),
            new_id: OrderId::from_nanos(20),
            price: Price::from_double(2000.0),
            qty: Qty::from_double(0.5),
            last_qty: Qty::from_double(0.25),
        };
        let json_str = encode_json(&req);
        assert!(json_str.contains("\"cancelOrigClientOrderId\":10"));
        assert!(json_str.contains("\"newClientOrderId\":20"));
    }
}
