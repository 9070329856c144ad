//! Payment gateway registry.
//!
//! The checkout bridges a fixed set of gateways. Which ones are offered comes
//! from `CHECKOUT_PAYMENT_GATEWAYS`; `stripe` is only usable when Stripe keys
//! are configured.

use core::fmt;
use std::str::FromStr;

use serde::Serialize;

use directpay_core::{Locale, Money};

/// Gateways the checkout knows how to bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayId {
    Stripe,
    Cod,
    Bacs,
    Cheque,
}

impl GatewayId {
    pub const ALL: [Self; 4] = [Self::Stripe, Self::Cod, Self::Bacs, Self::Cheque];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stripe => "stripe",
            Self::Cod => "cod",
            Self::Bacs => "bacs",
            Self::Cheque => "cheque",
        }
    }

    /// Payment is collected outside the checkout, so the order can proceed
    /// straight to processing.
    #[must_use]
    pub const fn is_manual(self) -> bool {
        matches!(self, Self::Cod)
    }

    /// Whether the front end renders fields for this gateway.
    #[must_use]
    pub const fn has_fields(self) -> bool {
        matches!(self, Self::Stripe)
    }

    /// Admin-facing name.
    #[must_use]
    pub const fn method_title(self) -> &'static str {
        match self {
            Self::Stripe => "Stripe",
            Self::Cod => "Cash on delivery",
            Self::Bacs => "Direct bank transfer",
            Self::Cheque => "Check payments",
        }
    }

    /// Customer-facing title in `locale`.
    #[must_use]
    pub const fn title(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Self::Stripe, Locale::EnUs) => "Credit Card (Stripe)",
            (Self::Stripe, Locale::FrFr) => "Carte de crédit (Stripe)",
            (Self::Stripe, Locale::EsEs) => "Tarjeta de crédito (Stripe)",
            (Self::Stripe, Locale::DeDe) => "Kreditkarte (Stripe)",
            (Self::Cod, Locale::EnUs) => "Cash on delivery",
            (Self::Cod, Locale::FrFr) => "Paiement à la livraison",
            (Self::Cod, Locale::EsEs) => "Contra reembolso",
            (Self::Cod, Locale::DeDe) => "Nachnahme",
            (Self::Bacs, Locale::EnUs) => "Direct bank transfer",
            (Self::Bacs, Locale::FrFr) => "Virement bancaire",
            (Self::Bacs, Locale::EsEs) => "Transferencia bancaria directa",
            (Self::Bacs, Locale::DeDe) => "Direkte Banküberweisung",
            (Self::Cheque, Locale::EnUs) => "Check payments",
            (Self::Cheque, Locale::FrFr) => "Paiement par chèque",
            (Self::Cheque, Locale::EsEs) => "Pagos por cheque",
            (Self::Cheque, Locale::DeDe) => "Scheckzahlungen",
        }
    }

    #[must_use]
    pub const fn description(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Self::Stripe, Locale::EnUs) => "Pay with your credit card via Stripe.",
            (Self::Stripe, Locale::FrFr) => "Payez par carte de crédit via Stripe.",
            (Self::Stripe, Locale::EsEs) => "Paga con tu tarjeta de crédito a través de Stripe.",
            (Self::Stripe, Locale::DeDe) => "Bezahlen Sie mit Ihrer Kreditkarte über Stripe.",
            (Self::Cod, Locale::EnUs) => "Pay with cash upon delivery.",
            (Self::Cod, Locale::FrFr) => "Payez en espèces à la livraison.",
            (Self::Cod, Locale::EsEs) => "Paga en efectivo en la entrega.",
            (Self::Cod, Locale::DeDe) => "Bezahlen Sie bar bei Lieferung.",
            (Self::Bacs, Locale::EnUs) => {
                "Make your payment directly into our bank account. Please use your order ID as the payment reference."
            }
            (Self::Bacs, Locale::FrFr) => {
                "Effectuez le paiement directement sur notre compte bancaire. Utilisez l'ID de votre commande comme référence du paiement."
            }
            (Self::Bacs, Locale::EsEs) => {
                "Realiza tu pago directamente en nuestra cuenta bancaria. Usa el número de pedido como referencia de pago."
            }
            (Self::Bacs, Locale::DeDe) => {
                "Überweisen Sie direkt an unsere Bankverbindung. Bitte nutzen Sie die Bestellnummer als Verwendungszweck."
            }
            (Self::Cheque, Locale::EnUs) => "Please send a check to our store address.",
            (Self::Cheque, Locale::FrFr) => "Veuillez envoyer un chèque à l'adresse de notre boutique.",
            (Self::Cheque, Locale::EsEs) => "Por favor, envía un cheque a la dirección de nuestra tienda.",
            (Self::Cheque, Locale::DeDe) => "Bitte senden Sie einen Scheck an die Adresse unseres Shops.",
        }
    }
}

impl fmt::Display for GatewayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GatewayId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stripe" => Ok(Self::Stripe),
            "cod" => Ok(Self::Cod),
            "bacs" => Ok(Self::Bacs),
            "cheque" => Ok(Self::Cheque),
            other => Err(format!("unknown payment gateway: {other}")),
        }
    }
}

/// A gateway as listed by `GET /payment-methods`.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentMethod {
    pub id: GatewayId,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub has_fields: bool,
    pub method_title: &'static str,
}

/// The enabled gateway set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gateways {
    enabled: Vec<GatewayId>,
}

impl Gateways {
    /// Keep configuration order and drop duplicates.
    #[must_use]
    pub fn new(enabled: impl IntoIterator<Item = GatewayId>) -> Self {
        let mut list = Vec::new();
        for id in enabled {
            if !list.contains(&id) {
                list.push(id);
            }
        }
        Self { enabled: list }
    }

    /// Resolve a client-supplied gateway id to an enabled gateway.
    #[must_use]
    pub fn resolve(&self, id: &str) -> Option<GatewayId> {
        id.parse::<GatewayId>()
            .ok()
            .filter(|gateway| self.enabled.contains(gateway))
    }

    #[must_use]
    pub fn is_enabled(&self, id: GatewayId) -> bool {
        self.enabled.contains(&id)
    }

    /// Gateways available for a cart of `amount`.
    ///
    /// Card payments need something to charge, so Stripe is hidden unless the
    /// amount is positive.
    #[must_use]
    pub fn available(&self, locale: Locale, amount: Option<Money>) -> Vec<PaymentMethod> {
        let chargeable = amount.is_some_and(|a| !a.is_zero());
        self.enabled
            .iter()
            .copied()
            .filter(|id| *id != GatewayId::Stripe || chargeable)
            .map(|id| PaymentMethod {
                id,
                title: id.title(locale),
                description: id.description(locale),
                icon: "",
                has_fields: id.has_fields(),
                method_title: id.method_title(),
            })
            .collect()
    }
}
