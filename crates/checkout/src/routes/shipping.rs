//! Shipping rates, pickup locations and pricing route handlers.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use directpay_core::{CountryCode, Locale, Money, ShippingProvider};

use crate::error::{AppError, AppJson, AppQuery, Result};
use crate::middleware::{CookieUpdate, RequireAdmin, ShippingSession};
use crate::models::{CheckoutLocation, PickupLocation, PricingRule, PricingTable, ShippingRate};
use crate::services::{catalog, rates};
use crate::state::AppState;

/// Parse the `type` parameter (`chronopost`, `mondial-relay`).
fn parse_provider(raw: Option<&str>) -> Result<ShippingProvider> {
    let raw = raw.map(str::trim).unwrap_or_default();
    raw.parse()
        .map_err(|_| AppError::InvalidType(raw.to_owned()))
}

fn country_or_default(raw: Option<&str>) -> Result<CountryCode> {
    match raw.map(str::trim) {
        None | Some("") => Ok(CountryCode::france()),
        Some(code) => Ok(CountryCode::parse(code)?),
    }
}

/// Rates for `country`, discounted when the caller's session is active.
async fn session_rates(
    state: &AppState,
    session: &ShippingSession,
    country: &CountryCode,
) -> Result<Vec<ShippingRate>> {
    let pricing = catalog::pricing(state.settings()).await?;
    let title = catalog::shipping_method(state.settings()).await?.title;
    let mut rates = rates::rates_for_country(&pricing, country, &title);
    if session.active.is_some() {
        rates::apply_session_discount(&mut rates);
    }
    Ok(rates)
}

// =============================================================================
// Checkout endpoints
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ShippingMethodsQuery {
    pub country: Option<String>,
    pub locale: Option<String>,
}

/// A shipping rate as listed to the checkout page.
#[derive(Debug, Serialize)]
pub struct ShippingMethodView {
    pub id: String,
    pub method_id: String,
    pub name: String,
    pub description: &'static str,
    pub cost: Money,
    pub meta: BTreeMap<String, String>,
}

impl From<ShippingRate> for ShippingMethodView {
    fn from(rate: ShippingRate) -> Self {
        Self {
            id: rate.id,
            method_id: rate.method_id,
            name: rate.label,
            description: "",
            cost: rate.cost,
            meta: rate.meta,
        }
    }
}

/// List shipping rates for a destination country.
#[instrument(skip(state, session))]
pub async fn shipping_methods(
    State(state): State<AppState>,
    session: ShippingSession,
    AppQuery(query): AppQuery<ShippingMethodsQuery>,
) -> Result<impl IntoResponse> {
    let country = country_or_default(query.country.as_deref())?;
    Locale::parse_or_default(query.locale.as_deref())?;

    let rates = session_rates(&state, &session, &country).await?;
    let methods: Vec<ShippingMethodView> = rates.into_iter().map(Into::into).collect();

    let cookie = CookieUpdate::clear_if_stale(&session, state.config().secure_cookies());
    Ok((cookie, Json(methods)))
}

/// Body of `POST /calculate-shipping`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CalculateShippingRequest {
    pub amount: Option<Decimal>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RateAmount {
    pub id: String,
    pub label: String,
    pub amount: Money,
}

#[derive(Debug, Serialize)]
pub struct LineItem {
    pub label: String,
    pub amount: Money,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateShippingResponse {
    pub success: bool,
    pub shipping_rates: Vec<RateAmount>,
    pub line_items: Vec<LineItem>,
    pub total: Money,
}

impl CalculateShippingResponse {
    /// Product line plus the first rate, totalled.
    fn new(amount: Money, rates: Vec<ShippingRate>) -> Self {
        let shipping_rates: Vec<RateAmount> = rates
            .into_iter()
            .map(|r| RateAmount {
                id: r.id,
                label: r.label,
                amount: r.cost,
            })
            .collect();

        let mut line_items = vec![LineItem {
            label: "Product".to_owned(),
            amount,
        }];
        let mut total = amount;
        if let Some(first) = shipping_rates.first() {
            line_items.push(LineItem {
                label: first.label.clone(),
                amount: first.amount,
            });
            total += first.amount;
        }

        Self {
            success: true,
            shipping_rates,
            line_items,
            total,
        }
    }
}

/// Price an amount with shipping for the express checkout sheet.
#[instrument(skip(state, session, body))]
pub async fn calculate_shipping(
    State(state): State<AppState>,
    session: ShippingSession,
    AppJson(body): AppJson<CalculateShippingRequest>,
) -> Result<Json<CalculateShippingResponse>> {
    let amount = body.amount.ok_or(AppError::MissingField("amount"))?;
    let amount = Money::new(amount)
        .map_err(|_| AppError::InvalidAmount("Amount cannot be negative".to_string()))?;
    let country = body
        .country
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or(AppError::MissingField("country"))?;
    let country = CountryCode::parse(country)?;

    tracing::debug!(
        country = %country,
        city = body.city.as_deref().unwrap_or_default(),
        postal_code = body.postal_code.as_deref().unwrap_or_default(),
        "Calculating shipping"
    );

    let rates = session_rates(&state, &session, &country).await?;
    Ok(Json(CalculateShippingResponse::new(amount, rates)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CheckoutLocationsQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub country: Option<String>,
}

/// Pickup locations for one provider, optionally filtered by country.
#[instrument(skip(state))]
pub async fn checkout_locations(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CheckoutLocationsQuery>,
) -> Result<Json<Vec<CheckoutLocation>>> {
    let provider = parse_provider(query.kind.as_deref())?;
    let country = query
        .country
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(CountryCode::parse)
        .transpose()?;

    let locations = catalog::checkout_locations(state.settings(), provider, country.as_ref()).await?;
    Ok(Json(locations))
}

// =============================================================================
// Admin endpoints
// =============================================================================

#[derive(Debug, Serialize)]
pub struct LocationsResponse {
    pub chronopost: Vec<PickupLocation>,
    pub mondial_relay: Vec<PickupLocation>,
    pub chronopost_pricing: PricingTable,
    pub mondial_relay_pricing: PricingTable,
}

/// All pickup locations and pricing tables.
#[instrument(skip(state, _admin))]
pub async fn list_locations(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<LocationsResponse>> {
    let settings = state.settings();
    Ok(Json(LocationsResponse {
        chronopost: catalog::locations(settings, ShippingProvider::Chronopost).await?,
        mondial_relay: catalog::locations(settings, ShippingProvider::MondialRelay).await?,
        chronopost_pricing: catalog::pricing_table(settings, ShippingProvider::Chronopost).await?,
        mondial_relay_pricing: catalog::pricing_table(settings, ShippingProvider::MondialRelay)
            .await?,
    }))
}

/// Body of `POST /shipping/locations`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AddLocationRequest {
    pub name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl AddLocationRequest {
    fn validate(self) -> Result<(ShippingProvider, catalog::NewLocation)> {
        let required = [
            ("name", &self.name),
            ("address", &self.address),
            ("city", &self.city),
            ("postalCode", &self.postal_code),
            ("country", &self.country),
            ("type", &self.kind),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(AppError::MissingField(*field));
        }

        let provider = parse_provider(Some(&self.kind))?;
        let location = catalog::NewLocation {
            name: self.name.trim().to_owned(),
            address: self.address.trim().to_owned(),
            city: self.city.trim().to_owned(),
            postal_code: self.postal_code.trim().to_owned(),
            country: CountryCode::parse(&self.country)?,
        };
        Ok((provider, location))
    }
}

#[derive(Debug, Serialize)]
pub struct LocationAdded {
    pub message: &'static str,
    pub location: PickupLocation,
}

/// Add a pickup location.
#[instrument(skip(state, _admin, body))]
pub async fn add_location(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    AppJson(body): AppJson<AddLocationRequest>,
) -> Result<impl IntoResponse> {
    let (provider, new) = body.validate()?;
    let location = catalog::add_location(state.settings(), provider, new, state.now()).await?;

    Ok((
        StatusCode::CREATED,
        Json(LocationAdded {
            message: "Location added successfully",
            location,
        }),
    ))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TypeQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Remove a pickup location. Unknown ids are not an error.
#[instrument(skip(state, _admin))]
pub async fn delete_location(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<String>,
    AppQuery(query): AppQuery<TypeQuery>,
) -> Result<Json<MessageResponse>> {
    let provider = parse_provider(query.kind.as_deref())?;
    catalog::remove_location(state.settings(), provider, &id).await?;
    Ok(Json(MessageResponse {
        message: "Location deleted successfully",
    }))
}

/// Body of `POST /shipping/pricing`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SetPricingRequest {
    pub country: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub express_price: Option<Decimal>,
    pub normal_price: Option<Decimal>,
}

impl SetPricingRequest {
    fn validate(self) -> Result<(ShippingProvider, CountryCode, Money, Money)> {
        if self.country.trim().is_empty() {
            return Err(AppError::MissingField("country"));
        }
        if self.kind.trim().is_empty() {
            return Err(AppError::MissingField("type"));
        }

        let price = |value: Option<Decimal>| {
            value
                .map(Money::new)
                .transpose()
                .map(Option::unwrap_or_default)
                .map_err(|_| AppError::InvalidAmount("Prices cannot be negative".to_string()))
        };
        let express = price(self.express_price)?;
        let normal = price(self.normal_price)?;
        if express.is_zero() && normal.is_zero() {
            return Err(AppError::MissingPrice(
                "At least one delivery price must be set".to_string(),
            ));
        }

        let provider = parse_provider(Some(&self.kind))?;
        let country = CountryCode::parse(&self.country)?;
        Ok((provider, country, express, normal))
    }
}

#[derive(Debug, Serialize)]
pub struct PricingSaved {
    pub message: &'static str,
    pub country: CountryCode,
    pub pricing: PricingRule,
}

/// Insert or replace a country's pricing.
#[instrument(skip(state, _admin, body))]
pub async fn set_pricing(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    AppJson(body): AppJson<SetPricingRequest>,
) -> Result<impl IntoResponse> {
    let (provider, country, express, normal) = body.validate()?;
    let pricing = catalog::set_pricing(
        state.settings(),
        provider,
        country.clone(),
        express,
        normal,
        state.now(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(PricingSaved {
            message: "Pricing rule added successfully",
            country,
            pricing,
        }),
    ))
}

/// Remove a country's pricing.
#[instrument(skip(state, _admin))]
pub async fn delete_pricing(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(country): Path<String>,
    AppQuery(query): AppQuery<TypeQuery>,
) -> Result<Json<MessageResponse>> {
    let provider = parse_provider(query.kind.as_deref())?;
    let country = CountryCode::parse(&country)?;
    catalog::remove_pricing(state.settings(), provider, &country).await?;
    Ok(Json(MessageResponse {
        message: "Pricing rule deleted successfully",
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_accepts_admin_spelling() {
        assert_eq!(parse_provider(Some("mondial-relay")).unwrap(), ShippingProvider::MondialRelay);
        assert_eq!(parse_provider(Some("invalid")).unwrap_err().code(), "invalid_type");
        assert_eq!(parse_provider(None).unwrap_err().code(), "invalid_type");
    }

    #[test]
    fn test_pricing_needs_one_price() {
        let req = SetPricingRequest {
            country: "FR".to_owned(),
            kind: "chronopost".to_owned(),
            express_price: Some(Decimal::ZERO),
            normal_price: None,
        };
        assert_eq!(req.validate().unwrap_err().code(), "missing_price");
    }

    #[test]
    fn test_location_reports_first_missing_field() {
        let req = AddLocationRequest {
            name: "Relais".to_owned(),
            address: "1 rue".to_owned(),
            city: "Lyon".to_owned(),
            ..AddLocationRequest::default()
        };
        let err = req.validate().unwrap_err();
        assert_eq!(err.to_string(), "Missing required field: postalCode");
    }

    #[test]
    fn test_calculate_response_adds_first_rate() {
        let rate = ShippingRate {
            id: "directpay_shipping_chronopost_normal".to_owned(),
            method_id: "directpay_shipping".to_owned(),
            label: "Pickup Point Delivery - Chronopost Normal".to_owned(),
            cost: "4.90".parse().unwrap(),
            meta: BTreeMap::new(),
        };
        let response = CalculateShippingResponse::new("20".parse().unwrap(), vec![rate]);
        assert_eq!(response.line_items.len(), 2);
        assert_eq!(response.line_items[1].amount, "4.9".parse().unwrap());
        assert_eq!(response.total, "24.90".parse().unwrap());
    }

    #[test]
    fn test_calculate_response_without_rates() {
        let response = CalculateShippingResponse::new("20".parse().unwrap(), Vec::new());
        assert_eq!(response.line_items.len(), 1);
        assert_eq!(response.total, "20".parse().unwrap());
    }
}
