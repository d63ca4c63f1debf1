//! Order report export.
//!
//! The report collaborator reads all orders and renders them to an external
//! document format. Rendering is a non-goal beyond a plain CSV, which is
//! enough for spreadsheet import.

use crate::models::Order;

const HEADER: &str = "order_id,order_code,order_date,total_price,quantity,customer_id,item_id";

/// Render all orders as CSV, header row first.
#[must_use]
pub fn orders_to_csv(orders: &[Order]) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    for order in orders {
        out.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            order.id,
            csv_field(&order.code),
            order.order_date.format("%Y-%m-%d"),
            order.total_price,
            order.quantity,
            order.customer_id,
            order.item_id,
        ));
    }
    out
}

/// Quote a field when it contains CSV metacharacters.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono::Utc;
    use shopd_core::{CustomerId, ItemId, OrderId};

    use super::*;

    fn order(id: i64, code: &str) -> Order {
        Order {
            id: OrderId::new(id),
            code: code.to_owned(),
            order_date: Utc
                .with_ymd_and_hms(2024, 6, 1, 15, 30, 0)
                .single()
                .expect("date"),
            total_price: 12.5,
            quantity: 5,
            customer_id: CustomerId::new(2),
            item_id: ItemId::new(3),
        }
    }

    #[test]
    fn empty_report_is_just_the_header() {
        assert_eq!(orders_to_csv(&[]), format!("{HEADER}\n"));
    }

    #[test]
    fn rows_carry_date_only_and_ids() {
        let csv = orders_to_csv(&[order(1, "ORD-1")]);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(HEADER));
        assert_eq!(lines.next(), Some("1,ORD-1,2024-06-01,12.5,5,2,3"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn codes_with_commas_are_quoted() {
        let csv = orders_to_csv(&[order(1, "a,b\"c")]);
        assert!(csv.contains("\"a,b\"\"c\""));
    }
}
