//! Checkout submission decoding and validation.
//!
//! Validation is all-or-nothing and touches no store. The first offending
//! field, in a fixed order, is reported.

use std::collections::HashSet;

use common::ProductId;
use serde::Deserialize;

use super::{PaymentMethod, Quantity};
use crate::email::Email;
use crate::error::{ValidationError, optional_text, required_text};

const MAX_ADDRESS_LEN: usize = 1_000;
const MAX_PHONE_LEN: usize = 32;
const MAX_NAME_LEN: usize = 255;

/// A checkout request as the client sent it.
///
/// Every field is optional at the decoding stage so missing input is
/// reported as a validation error rather than a decoding failure. Price
/// fields sent by clients are not modelled and therefore ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderSubmission {
    #[serde(default, alias = "items")]
    pub cart: Option<Vec<SubmittedLine>>,
    #[serde(default)]
    pub shipping_address: Option<String>,
    #[serde(default, alias = "phone")]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// One proposed cart line.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmittedLine {
    #[serde(default)]
    pub product_id: Option<i64>,
    #[serde(default)]
    pub quantity: Option<i64>,
}

impl SubmittedLine {
    pub fn new(product_id: i64, quantity: i64) -> Self {
        Self {
            product_id: Some(product_id),
            quantity: Some(quantity),
        }
    }
}

/// A product reference with a valid quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: Quantity,
}

/// Where the order goes and who to contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingDetails {
    pub address: String,
    pub phone: String,
    pub customer_name: Option<String>,
    pub email: Option<Email>,
}

/// A submission that passed every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedOrder {
    pub lines: Vec<CartLine>,
    pub shipping: ShippingDetails,
    pub payment_method: PaymentMethod,
}

impl OrderSubmission {
    /// Checks the submission, reporting the first offending field.
    pub fn validate(&self) -> Result<ValidatedOrder, ValidationError> {
        let lines = validate_cart(self.cart.as_deref())?;

        let address = required_text(
            "shipping_address",
            self.shipping_address.as_deref(),
            MAX_ADDRESS_LEN,
        )?;
        let phone = required_text("contact_phone", self.contact_phone.as_deref(), MAX_PHONE_LEN)?;

        let payment_method = match self.payment_method.as_deref().map(str::trim) {
            None | Some("") => return Err(ValidationError::required("payment_method")),
            Some(raw) => raw.to_ascii_lowercase().parse::<PaymentMethod>().map_err(|_| {
                ValidationError::new(
                    "payment_method",
                    "must be one of: cash-on-delivery, online",
                )
            })?,
        };

        let customer_name =
            optional_text("customer_name", self.customer_name.as_deref(), MAX_NAME_LEN)?;
        let email = match self.email.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(Email::parse("email", raw)?),
        };

        Ok(ValidatedOrder {
            lines,
            shipping: ShippingDetails {
                address,
                phone,
                customer_name,
                email,
            },
            payment_method,
        })
    }
}

fn validate_cart(cart: Option<&[SubmittedLine]>) -> Result<Vec<CartLine>, ValidationError> {
    let cart = match cart {
        Some(cart) if !cart.is_empty() => cart,
        _ => return Err(ValidationError::new("cart", "must contain at least one item")),
    };

    let mut lines = Vec::with_capacity(cart.len());
    for (i, line) in cart.iter().enumerate() {
        let product_id = match line.product_id {
            Some(id) if id > 0 => ProductId::new(id),
            Some(_) => {
                return Err(ValidationError::new(
                    format!("cart[{i}].product_id"),
                    "must be a positive integer",
                ));
            }
            None => return Err(ValidationError::required(format!("cart[{i}].product_id"))),
        };

        let quantity = match line.quantity {
            Some(raw) => Quantity::new(raw).ok_or_else(|| {
                ValidationError::new(
                    format!("cart[{i}].quantity"),
                    format!("must be between 1 and {}", Quantity::MAX),
                )
            })?,
            None => return Err(ValidationError::required(format!("cart[{i}].quantity"))),
        };

        lines.push(CartLine {
            product_id,
            quantity,
        });
    }

    let mut seen = HashSet::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        if !seen.insert(line.product_id) {
            return Err(ValidationError::new(
                format!("cart[{i}].product_id"),
                format!("product {} appears more than once", line.product_id),
            ));
        }
    }

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> OrderSubmission {
        OrderSubmission {
            cart: Some(vec![SubmittedLine::new(7, 2)]),
            shipping_address: Some("12 MG Road, Bengaluru".to_string()),
            contact_phone: Some("9876543210".to_string()),
            payment_method: Some("cash-on-delivery".to_string()),
            customer_name: None,
            email: None,
        }
    }

    fn field_of(submission: &OrderSubmission) -> String {
        submission.validate().unwrap_err().field
    }

    #[test]
    fn accepts_minimal_submission() {
        let order = valid().validate().unwrap();
        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.lines[0].product_id, ProductId::new(7));
        assert_eq!(order.lines[0].quantity.get(), 2);
        assert_eq!(order.payment_method, PaymentMethod::CashOnDelivery);
        assert_eq!(order.shipping.customer_name, None);
    }

    #[test]
    fn empty_or_missing_cart_is_rejected() {
        let mut s = valid();
        s.cart = Some(vec![]);
        assert_eq!(field_of(&s), "cart");

        s.cart = None;
        assert_eq!(field_of(&s), "cart");
    }

    #[test]
    fn cart_is_checked_before_other_fields() {
        let s = OrderSubmission::default();
        assert_eq!(field_of(&s), "cart");
    }

    #[test]
    fn line_errors_name_the_index() {
        let mut s = valid();
        s.cart = Some(vec![
            SubmittedLine::new(1, 1),
            SubmittedLine {
                product_id: Some(2),
                quantity: None,
            },
        ]);
        assert_eq!(field_of(&s), "cart[1].quantity");

        s.cart = Some(vec![SubmittedLine::new(0, 1)]);
        assert_eq!(field_of(&s), "cart[0].product_id");

        s.cart = Some(vec![SubmittedLine::new(3, 0)]);
        assert_eq!(field_of(&s), "cart[0].quantity");

        s.cart = Some(vec![SubmittedLine::new(3, -1)]);
        assert_eq!(field_of(&s), "cart[0].quantity");

        s.cart = Some(vec![SubmittedLine::new(3, 10_001)]);
        assert_eq!(field_of(&s), "cart[0].quantity");
    }

    #[test]
    fn duplicate_products_are_rejected() {
        let mut s = valid();
        s.cart = Some(vec![
            SubmittedLine::new(4, 1),
            SubmittedLine::new(5, 1),
            SubmittedLine::new(4, 2),
        ]);
        let err = s.validate().unwrap_err();
        assert_eq!(err.field, "cart[2].product_id");
        assert!(err.message.contains("more than once"));
    }

    #[test]
    fn blank_required_text_is_rejected_in_order() {
        let mut s = valid();
        s.shipping_address = Some("   ".to_string());
        s.contact_phone = None;
        assert_eq!(field_of(&s), "shipping_address");

        s.shipping_address = Some("Somewhere".to_string());
        assert_eq!(field_of(&s), "contact_phone");

        s.contact_phone = Some("123".to_string());
        s.payment_method = Some("".to_string());
        assert_eq!(field_of(&s), "payment_method");
    }

    #[test]
    fn unknown_payment_method_is_rejected() {
        let mut s = valid();
        s.payment_method = Some("barter".to_string());
        let err = s.validate().unwrap_err();
        assert_eq!(err.field, "payment_method");
        assert!(err.message.contains("cash-on-delivery"));

        s.payment_method = Some(" Online ".to_string());
        assert_eq!(s.validate().unwrap().payment_method, PaymentMethod::Online);
    }

    #[test]
    fn optional_fields_are_trimmed_and_checked() {
        let mut s = valid();
        s.customer_name = Some("  Asha Rao ".to_string());
        s.email = Some(" Asha@Example.com".to_string());
        let order = s.validate().unwrap();
        assert_eq!(order.shipping.customer_name.as_deref(), Some("Asha Rao"));
        assert_eq!(
            order.shipping.email.as_ref().map(Email::as_str),
            Some("asha@example.com")
        );

        s.email = Some("not-an-email".to_string());
        assert_eq!(field_of(&s), "email");

        s.email = Some("   ".to_string());
        assert!(s.validate().unwrap().shipping.email.is_none());
    }

    #[test]
    fn decodes_aliases_and_ignores_prices() {
        let json = r#"{
            "items": [{"product_id": 7, "quantity": 2, "price_per_unit": 0.01}],
            "shipping_address": "Flat 3, Lake View",
            "phone": "9000000001",
            "payment_method": "online",
            "total_amount": 0.02
        }"#;
        let submission: OrderSubmission = serde_json::from_str(json).unwrap();
        let order = submission.validate().unwrap();
        assert_eq!(order.lines[0].quantity.get(), 2);
        assert_eq!(order.shipping.phone, "9000000001");
    }
}
