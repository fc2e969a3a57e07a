use askama::Template;
use domain::catalog::{FilterState, PriceBucket, Product, ProductId, SpecEntry, toggle_expand};
use domain::contact::{ContactForm, ContactSubject};
use domain::purchase::PurchaseReceipt;
use domain::validation::FormErrors;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub user: Option<String>,
    pub brands: Vec<SelectOption>,
    pub prices: Vec<SelectOption>,
    pub query: String,
    pub products: Vec<ProductCard>,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub user: Option<String>,
    pub error: Option<String>,
    pub email: String,
    pub next: String,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub user: Option<String>,
    pub error: Option<String>,
    pub email: String,
    pub name: String,
    pub next: String,
}

#[derive(Template)]
#[template(path = "confirm_purchase.html")]
pub struct ConfirmPurchaseTemplate {
    pub user: Option<String>,
    pub product: ProductCard,
    pub prompt: String,
}

#[derive(Template)]
#[template(path = "receipt.html")]
pub struct ReceiptTemplate {
    pub user: Option<String>,
    pub message: String,
    pub reference: String,
    pub title: String,
    pub price: String,
    pub estimated_delivery: String,
}

#[derive(Template)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub user: Option<String>,
    pub form: ContactForm,
    pub subjects: Vec<SelectOption>,
    pub errors: ContactErrors,
    pub sent: bool,
}

/// Plain page with a heading, one paragraph and a way back
#[derive(Template)]
#[template(path = "message.html")]
pub struct MessageTemplate {
    pub user: Option<String>,
    pub title: String,
    pub message: String,
}

#[derive(Clone)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

// Struct for product display in templates
#[derive(Clone)]
pub struct ProductCard {
    pub id: ProductId,
    pub title: String,
    pub brand: String,
    pub price: String,
    pub image: String,
    pub short_description: String,
    pub specs: Vec<SpecEntry>,
    pub in_stock: bool,
    pub expanded: bool,
    pub toggle_href: String,
    pub buy_href: String,
}

/// Per-field messages for the contact form, empty when the field is fine
#[derive(Default)]
pub struct ContactErrors {
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub order_number: Option<String>,
    pub phone: Option<String>,
    pub product_model: Option<String>,
}

impl ProductCard {
    pub fn from_product(product: &Product, filter: &FilterState, open: Option<ProductId>) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            brand: product.brand.clone(),
            price: format_price(product.price),
            image: product.image.clone(),
            short_description: product.short_description.clone(),
            specs: product.specs.clone(),
            in_stock: product.in_stock,
            expanded: open == Some(product.id),
            toggle_href: stock_href(filter, toggle_expand(open, product.id)),
            buy_href: format!("/products/{}/buy", product.id),
        }
    }
}

impl ContactErrors {
    pub fn from_form_errors(errors: &FormErrors) -> Self {
        let get = |field: &str| errors.get(field).map(String::from);
        Self {
            name: get("name"),
            email: get("email"),
            subject: get("subject"),
            message: get("message"),
            order_number: get("order_number"),
            phone: get("phone"),
            product_model: get("product_model"),
        }
    }
}

pub fn brand_options(brands: Vec<String>, filter: &FilterState) -> Vec<SelectOption> {
    brands
        .into_iter()
        .map(|brand| SelectOption {
            selected: brand == filter.brand,
            label: brand.clone(),
            value: brand,
        })
        .collect()
}

pub fn price_options(filter: &FilterState) -> Vec<SelectOption> {
    PriceBucket::ALL
        .iter()
        .map(|bucket| SelectOption {
            value: bucket.as_param().to_string(),
            label: bucket.label().to_string(),
            selected: *bucket == filter.price_bucket,
        })
        .collect()
}

pub fn subject_options(selected: &str) -> Vec<SelectOption> {
    ContactSubject::ALL
        .iter()
        .map(|subject| SelectOption {
            value: subject.label().to_string(),
            label: subject.label().to_string(),
            selected: subject.label() == selected,
        })
        .collect()
}

/// Link back to the stock section keeping the current filters
pub fn stock_href(filter: &FilterState, open: Option<ProductId>) -> String {
    let mut href = format!(
        "/?brand={}&price={}",
        urlencoding::encode(&filter.brand),
        filter.price_bucket.as_param()
    );
    if !filter.query.is_empty() {
        href.push_str(&format!("&q={}", urlencoding::encode(&filter.query)));
    }
    if let Some(id) = open {
        href.push_str(&format!("&open={id}"));
    }
    href.push_str("#stock");
    href
}

/// Whole dollar amounts without decimals, anything else with two
pub fn format_price(price: f64) -> String {
    if price.fract() == 0.0 {
        format!("${price:.0}")
    } else {
        format!("${price:.2}")
    }
}

impl ReceiptTemplate {
    pub fn from_receipt(user: Option<String>, receipt: &PurchaseReceipt) -> Self {
        Self {
            user,
            message: receipt.thank_you_message(),
            reference: receipt.reference.to_string(),
            title: receipt.title.clone(),
            price: format_price(receipt.price),
            estimated_delivery: receipt.estimated_delivery.format("%Y-%m-%d").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_href() {
        let filter = FilterState::default();
        assert_eq!(stock_href(&filter, None), "/?brand=All&price=all#stock");

        let filter = FilterState {
            brand: "Sony".to_string(),
            price_bucket: PriceBucket::Between300And600,
            query: "pro max".to_string(),
        };
        assert_eq!(
            stock_href(&filter, Some(1)),
            "/?brand=Sony&price=300-600&q=pro%20max&open=1#stock"
        );
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(799.0), "$799");
        assert_eq!(format_price(19.5), "$19.50");
    }
}
