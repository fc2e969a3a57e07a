use askama::Template;
use axum::{
    extract::{Form, Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use domain::catalog::{FilterState, ProductId};
use domain::core::{ClientId, Storefront};
use domain::contact::{ContactForm, ContactSubject};
use domain::purchase::{PurchaseError, PurchaseOutcome, confirmation_prompt};
use domain::user::AuthError;
use domain::validation::{FormErrors, validate_login, validate_registration};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::services::{
    client::{ClientCookie, clear_client_cookie, client_cookie},
    filter_from_params,
};
use crate::web::{
    AppState,
    templates::{
        ConfirmPurchaseTemplate, ContactErrors, ContactTemplate, IndexTemplate, LoginTemplate,
        MessageTemplate, ProductCard, ReceiptTemplate, RegisterTemplate, brand_options,
        price_options, subject_options,
    },
};

#[derive(Debug, Default, Deserialize)]
pub struct StockQuery {
    pub brand: Option<String>,
    pub price: Option<String>,
    pub q: Option<String>,
    pub open: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub next: String,
}

#[derive(Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub next: String,
}

fn render<T: Template>(template: &T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Failed to render template: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn render_with_status<T: Template>(status: StatusCode, template: &T) -> Response {
    let mut response = render(template);
    if response.status().is_success() {
        *response.status_mut() = status;
    }
    response
}

/// Only same-site paths are followed after signing in
fn safe_next(next: &str) -> &str {
    if next.starts_with('/') && !next.starts_with("//") {
        next
    } else {
        "/"
    }
}

fn user_name(shop: &Storefront, client: Option<ClientId>) -> Option<String> {
    shop.current_session(client)
        .map(|session| session.display_name().to_string())
}

/// Redirect that also hands the browser its client cookie
fn signed_in_redirect(client: ClientId, next: &str) -> Response {
    (
        [(header::SET_COOKIE, client_cookie(client))],
        Redirect::to(safe_next(next)),
    )
        .into_response()
}

fn first_message(errors: &FormErrors) -> Option<String> {
    errors.first().map(|error| error.message.clone())
}

fn buy_path(product_id: ProductId) -> String {
    format!("/products/{product_id}/buy")
}

fn sign_in_redirect(product_id: ProductId) -> Response {
    let next = buy_path(product_id);
    Redirect::to(&format!("/login?next={}", urlencoding::encode(&next))).into_response()
}

fn not_found(user: Option<String>, product_id: ProductId) -> Response {
    render_with_status(
        StatusCode::NOT_FOUND,
        &MessageTemplate {
            user,
            title: "Product not found".to_string(),
            message: PurchaseError::UnknownProduct(product_id).to_string(),
        },
    )
}

fn out_of_stock(user: Option<String>, title: String) -> Response {
    render_with_status(
        StatusCode::CONFLICT,
        &MessageTemplate {
            user,
            title: "Out of stock".to_string(),
            message: PurchaseError::OutOfStock(title).to_string(),
        },
    )
}

// Handler functions
pub async fn home(
    State(app_state): State<AppState>,
    ClientCookie(client): ClientCookie,
    Query(query): Query<StockQuery>,
) -> Response {
    let filter = filter_from_params(
        query.brand.as_deref(),
        query.price.as_deref(),
        query.q.as_deref(),
    );
    let open = query
        .open
        .as_deref()
        .and_then(|open| open.trim().parse::<ProductId>().ok());

    let shop = app_state.lock().await;
    let products: Vec<ProductCard> = shop
        .catalog
        .filter(&filter)
        .into_iter()
        .map(|product| ProductCard::from_product(product, &filter, open))
        .collect();
    debug!("Showing {} products for {filter:?}", products.len());

    let template = IndexTemplate {
        user: user_name(&shop, client),
        brands: brand_options(shop.catalog.brands(), &filter),
        prices: price_options(&filter),
        query: filter.query.clone(),
        products,
    };
    render(&template)
}

pub async fn login_page(
    State(app_state): State<AppState>,
    ClientCookie(client): ClientCookie,
    Query(query): Query<NextQuery>,
) -> Response {
    let next = query.next.unwrap_or_default();
    if app_state.lock().await.current_session(client).is_some() {
        return Redirect::to(safe_next(&next)).into_response();
    }

    render(&LoginTemplate {
        user: None,
        error: None,
        email: String::new(),
        next,
    })
}

pub async fn login_submit(
    State(app_state): State<AppState>,
    ClientCookie(client): ClientCookie,
    Form(form): Form<LoginForm>,
) -> Response {
    let input = match validate_login(&form.email, &form.password) {
        Ok(input) => input,
        Err(errors) => {
            warn!("Login form rejected: {errors}");
            return render(&LoginTemplate {
                user: None,
                error: first_message(&errors),
                email: form.email,
                next: form.next,
            });
        }
    };

    let mut shop = app_state.lock().await;
    match shop.sign_in(client, &input.email, &input.password).await {
        Ok((client, session)) => {
            info!("Signed in {}", session.email);
            signed_in_redirect(client, &form.next)
        }
        Err(e) => {
            if !matches!(e, AuthError::InvalidCredentials) {
                error!("Login failed for {}: {e}", input.email);
            }
            render(&LoginTemplate {
                user: None,
                error: Some(e.to_string()),
                email: input.email,
                next: form.next,
            })
        }
    }
}

pub async fn register_page(
    State(app_state): State<AppState>,
    ClientCookie(client): ClientCookie,
    Query(query): Query<NextQuery>,
) -> Response {
    let next = query.next.unwrap_or_default();
    if app_state.lock().await.current_session(client).is_some() {
        return Redirect::to(safe_next(&next)).into_response();
    }

    render(&RegisterTemplate {
        user: None,
        error: None,
        email: String::new(),
        name: String::new(),
        next,
    })
}

pub async fn register_submit(
    State(app_state): State<AppState>,
    ClientCookie(client): ClientCookie,
    Form(form): Form<RegisterForm>,
) -> Response {
    let input = match validate_registration(&form.email, &form.password, Some(&form.name)) {
        Ok(input) => input,
        Err(errors) => {
            warn!("Registration form rejected: {errors}");
            return render(&RegisterTemplate {
                user: None,
                error: first_message(&errors),
                email: form.email,
                name: form.name,
                next: form.next,
            });
        }
    };

    let mut shop = app_state.lock().await;
    match shop
        .register(client, &input.email, &input.password, input.name.as_deref())
        .await
    {
        Ok((client, session)) => {
            info!("Registered and signed in {}", session.email);
            signed_in_redirect(client, &form.next)
        }
        Err(e) => {
            let message = match e {
                AuthError::AlreadyExists => e.to_string(),
                _ => {
                    error!("Registration failed for {}: {e}", input.email);
                    "Could not create the account, please try again.".to_string()
                }
            };
            render(&RegisterTemplate {
                user: None,
                error: Some(message),
                email: input.email,
                name: form.name,
                next: form.next,
            })
        }
    }
}

pub async fn logout(
    State(app_state): State<AppState>,
    ClientCookie(client): ClientCookie,
) -> Response {
    app_state.lock().await.sign_out(client);
    (
        [(header::SET_COOKIE, clear_client_cookie())],
        Redirect::to("/"),
    )
        .into_response()
}

pub async fn confirm_purchase_page(
    State(app_state): State<AppState>,
    ClientCookie(client): ClientCookie,
    Path(product_id): Path<ProductId>,
) -> Response {
    let shop = app_state.lock().await;
    let session = shop.current_session(client);
    let user = session.map(|session| session.display_name().to_string());

    let Some(product) = shop.catalog.find(product_id) else {
        return not_found(user, product_id);
    };
    if session.is_none() {
        debug!("Anonymous buy attempt for {}, sending to sign-in", product.title);
        return sign_in_redirect(product_id);
    }
    if !product.in_stock {
        return out_of_stock(user, product.title.clone());
    }

    render(&ConfirmPurchaseTemplate {
        user,
        prompt: confirmation_prompt(product),
        product: ProductCard::from_product(product, &FilterState::default(), None),
    })
}

pub async fn purchase_submit(
    State(app_state): State<AppState>,
    ClientCookie(client): ClientCookie,
    Path(product_id): Path<ProductId>,
) -> Response {
    let shop = app_state.lock().await;
    let user = user_name(&shop, client);

    match shop.purchase(client, product_id) {
        Ok(PurchaseOutcome::Confirmed(receipt)) => {
            info!(
                "Purchase {} of {} confirmed for {}",
                receipt.reference, receipt.title, receipt.buyer_email
            );
            render(&ReceiptTemplate::from_receipt(user, &receipt))
        }
        Ok(PurchaseOutcome::SignInRequired) => sign_in_redirect(product_id),
        Err(PurchaseError::UnknownProduct(id)) => not_found(user, id),
        Err(PurchaseError::OutOfStock(title)) => out_of_stock(user, title),
    }
}

pub async fn contact_page(
    State(app_state): State<AppState>,
    ClientCookie(client): ClientCookie,
) -> Response {
    let user = user_name(&*app_state.lock().await, client);
    let form = ContactForm {
        subject: ContactSubject::default().label().to_string(),
        ..ContactForm::default()
    };

    render(&ContactTemplate {
        user,
        subjects: subject_options(&form.subject),
        form,
        errors: ContactErrors::default(),
        sent: false,
    })
}

pub async fn contact_submit(
    State(app_state): State<AppState>,
    ClientCookie(client): ClientCookie,
    Form(form): Form<ContactForm>,
) -> Response {
    let shop = app_state.lock().await;
    let user = user_name(&shop, client);

    match shop.submit_contact(&form) {
        Ok(_) => {
            let form = ContactForm {
                subject: ContactSubject::default().label().to_string(),
                ..ContactForm::default()
            };
            render(&ContactTemplate {
                user,
                subjects: subject_options(&form.subject),
                form,
                errors: ContactErrors::default(),
                sent: true,
            })
        }
        Err(errors) => render(&ContactTemplate {
            user,
            subjects: subject_options(&form.subject),
            errors: ContactErrors::from_form_errors(&errors),
            form,
            sent: false,
        }),
    }
}
