//! Purchase order message (ORDERS D.96A), reduced to header, parties and lines.
//!
//! ```text
//! UNA UNB
//! ┌ UNH BGM DTM
//! │ ┌ NAD ┐ optional
//! │ ┌ LIN QTY [PRI] ┐ mandatory
//! └ UNS UNT
//! UNZ
//! ```

use crate::error::{Result, ValidationError};
use crate::message::{InterchangeHeader, MessageKind, SegmentWriter};
use crate::model::segment::Format::{Alpha, Alphanumeric, Numeric};
use crate::model::segment::{ComponentRule as C, ElementRule as E, tags};
use crate::model::{Element, SegmentDef, SegmentRegistry};
use crate::util::datetime::{DATE_FORMAT_102, format_unb_datetime, parse_date_102};
use crate::validate::{BlueprintNode as N, BlueprintSpec};

/// UNH message identifier: type, version, release, agency.
pub const MESSAGE_TYPE: [&str; 4] = ["ORDERS", "D", "96A", "UN"];

/// UNB syntax identifier and version.
const SYNTAX: [&str; 2] = ["UNOC", "3"];

/// Partner identification code qualifier (GS1).
const PARTNER_QUALIFIER: &str = "14";

/// Beginning of message: document name code, number, function code.
pub static BGM: SegmentDef = SegmentDef::new(
    "BGM",
    &[
        E::mandatory(&[C::mandatory(Alphanumeric, 3)]),
        E::mandatory(&[C::mandatory(Alphanumeric, 35)]),
        E::optional(&[C::mandatory(Alphanumeric, 3)]),
    ],
);

/// Date/time/period: qualifier, value, format code.
pub static DTM: SegmentDef = SegmentDef::new(
    "DTM",
    &[E::mandatory(&[
        C::mandatory(Alphanumeric, 3),
        C::optional(Alphanumeric, 35),
        C::optional(Alphanumeric, 3),
    ])],
);

/// Name and address: party qualifier, party id : code list : agency.
pub static NAD: SegmentDef = SegmentDef::new(
    "NAD",
    &[
        E::mandatory(&[C::mandatory(Alphanumeric, 3)]),
        E::optional(&[
            C::mandatory(Alphanumeric, 35),
            C::optional(Alphanumeric, 17),
            C::optional(Alphanumeric, 3),
        ]),
    ],
);

/// Line item: line number, action, item number : type.
pub static LIN: SegmentDef = SegmentDef::new(
    "LIN",
    &[
        E::optional(&[C::mandatory(Numeric, 6)]),
        E::optional(&[C::mandatory(Alphanumeric, 3)]),
        E::optional(&[C::mandatory(Alphanumeric, 35), C::optional(Alphanumeric, 3)]),
    ],
);

/// Quantity: qualifier, quantity, unit.
pub static QTY: SegmentDef = SegmentDef::new(
    "QTY",
    &[E::mandatory(&[
        C::mandatory(Alphanumeric, 3),
        C::mandatory(Numeric, 15),
        C::optional(Alphanumeric, 3),
    ])],
);

/// Price details: qualifier, amount.
pub static PRI: SegmentDef = SegmentDef::new(
    "PRI",
    &[E::mandatory(&[C::mandatory(Alphanumeric, 3), C::optional(Numeric, 15)])],
);

/// Section control.
pub static UNS: SegmentDef = SegmentDef::new("UNS", &[E::mandatory(&[C::mandatory(Alpha, 1)])]);

/// A trading partner identified by a global location number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Party {
    pub id: String,
    /// Code list responsible agency (`9` = GS1).
    pub agency: String,
}

impl Party {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            agency: "9".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    /// Item number (EAN).
    pub article: String,
    pub quantity: u32,
    /// Net unit price, decimal point notation.
    pub price: Option<String>,
}

impl OrderLine {
    pub fn new(article: impl Into<String>, quantity: u32) -> Self {
        Self {
            article: article.into(),
            quantity,
            price: None,
        }
    }

    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price = Some(price.into());
        self
    }
}

/// One purchase order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub number: String,
    /// Order date, `CCYYMMDD`.
    pub date: String,
    pub buyer: Party,
    pub supplier: Option<Party>,
    pub lines: Vec<OrderLine>,
}

/// The ORDERS message kind.
#[derive(Debug, Clone)]
pub struct Orders {
    registry: SegmentRegistry,
    blueprint: BlueprintSpec,
}

impl Orders {
    pub fn new() -> Self {
        let registry = SegmentRegistry::with_service_segments()
            .with(&BGM)
            .with(&DTM)
            .with(&NAD)
            .with(&LIN)
            .with(&QTY)
            .with(&PRI)
            .with(&UNS);

        let blueprint = BlueprintSpec::new(vec![
            N::mandatory(tags::UNA),
            N::mandatory(tags::UNB),
            N::mandatory_loop(vec![
                N::mandatory(tags::UNH),
                N::mandatory(BGM.tag),
                N::mandatory(DTM.tag),
                N::optional_loop(vec![N::mandatory(NAD.tag)]),
                N::mandatory_loop(vec![
                    N::mandatory(LIN.tag),
                    N::mandatory(QTY.tag),
                    N::optional(PRI.tag),
                ]),
                N::mandatory(UNS.tag),
                N::mandatory(tags::UNT),
            ]),
            N::mandatory(tags::UNZ),
        ]);

        Self { registry, blueprint }
    }
}

impl Default for Orders {
    fn default() -> Self {
        Self::new()
    }
}

fn write_party(writer: &mut SegmentWriter<'_>, qualifier: &str, party: &Party) -> Result<()> {
    writer.write(
        NAD.tag,
        vec![qualifier.into(), Element::composite([party.id.as_str(), "", party.agency.as_str()])],
    )
}

impl MessageKind for Orders {
    type Payload = Order;

    fn registry(&self) -> &SegmentRegistry {
        &self.registry
    }

    fn blueprint(&self) -> &BlueprintSpec {
        &self.blueprint
    }

    fn write_header(
        &self,
        writer: &mut SegmentWriter<'_>,
        header: &InterchangeHeader<'_>,
    ) -> Result<()> {
        let (date, time) = format_unb_datetime(header.prepared_at);
        writer.write(
            tags::UNB,
            vec![
                Element::composite(SYNTAX),
                Element::composite([header.sender, PARTNER_QUALIFIER]),
                Element::composite([header.receiver, PARTNER_QUALIFIER]),
                Element::composite([date, time]),
                header.reference.into(),
            ],
        )
    }

    fn write_message(&self, writer: &mut SegmentWriter<'_>, order: &Order) -> Result<()> {
        if parse_date_102(&order.date).is_err() {
            return Err(ValidationError::SegmentInvalid {
                tag: DTM.tag,
                element: 0,
                component: 1,
                reason: "invalid calendar date",
            }
            .into());
        }

        let reference = (writer.message_count() + 1).to_string();
        writer.write(
            tags::UNH,
            vec![Element::from(&reference), Element::composite(MESSAGE_TYPE)],
        )?;
        writer.write(
            BGM.tag,
            vec!["220".into(), Element::from(&order.number), "9".into()],
        )?;
        writer.write(
            DTM.tag,
            vec![Element::composite(["137", order.date.as_str(), DATE_FORMAT_102])],
        )?;

        write_party(writer, "BY", &order.buyer)?;
        if let Some(supplier) = &order.supplier {
            write_party(writer, "SU", supplier)?;
        }

        for (i, line) in order.lines.iter().enumerate() {
            writer.write(
                LIN.tag,
                vec![
                    (i + 1).to_string().into(),
                    Element::default(),
                    Element::composite([line.article.as_str(), "EN"]),
                ],
            )?;
            writer.write(
                QTY.tag,
                vec![Element::composite(["21".to_string(), line.quantity.to_string()])],
            )?;
            if let Some(price) = &line.price {
                writer.write(PRI.tag, vec![Element::composite(["AAA", price.as_str()])])?;
            }
        }

        writer.write(UNS.tag, vec!["S".into()])?;
        let count = writer.unh_count() + 1;
        writer.write(tags::UNT, vec![count.to_string().into(), reference.into()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::message::{ConfigValue, MessageBuilder, Setting, keys};

    fn order() -> Order {
        Order {
            number: "PO-4711".to_string(),
            date: "20261016".to_string(),
            buyer: Party::new("5412345000013"),
            supplier: Some(Party::new("4012345000023")),
            lines: vec![
                OrderLine::new("4000862141404", 12).with_price("3.75"),
                OrderLine::new("4000862141411", 1),
            ],
        }
    }

    #[test]
    fn test_registry() {
        let orders = Orders::new();
        for tag in [
            "UNA", "UNB", "UNH", "BGM", "DTM", "NAD", "LIN", "QTY", "PRI", "UNS", "UNT", "UNZ",
        ] {
            assert!(orders.registry().contains(tag), "{tag} missing");
        }
        assert_eq!(orders.registry().len(), 12);
        assert_eq!(orders.blueprint().depth(), 2);
    }

    #[test]
    fn test_write_message() {
        let mut builder = MessageBuilder::new(Orders::new(), "4012345000023", "5412345000013");
        builder
            .add_prebuild_config(keys::INTERCHANGE_REFERENCE, Setting::literal("00000000000042"))
            .unwrap();
        builder
            .add_prebuild_config(
                keys::PREPARED_AT,
                Setting::literal(ConfigValue::Timestamp(1_792_143_000)),
            )
            .unwrap();
        builder.add_message(&order()).unwrap();
        assert_eq!(builder.unh_count(), 12);

        let mut reader = builder.get_or_fail().unwrap();
        assert_eq!(
            reader.to_edifact_string().unwrap(),
            "UNA:+.? '\
             UNB+UNOC:3+4012345000023:14+5412345000013:14+261016:0930+00000000000042'\
             UNH+1+ORDERS:D:96A:UN'\
             BGM+220+PO-4711+9'\
             DTM+137:20261016:102'\
             NAD+BY+5412345000013::9'\
             NAD+SU+4012345000023::9'\
             LIN+1++4000862141404:EN'\
             QTY+21:12'\
             PRI+AAA:3.75'\
             LIN+2++4000862141411:EN'\
             QTY+21:1'\
             UNS+S'\
             UNT+12+1'\
             UNZ+1+00000000000042'"
        );
        reader.validate_segments().unwrap();
    }

    #[test]
    fn test_invalid_date_rejected() {
        let mut builder = MessageBuilder::new(Orders::new(), "S", "R");
        let mut bad = order();
        bad.date = "20260230".to_string();
        let err = builder.add_message(&bad).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::SegmentInvalid {
                tag: "DTM",
                reason: "invalid calendar date",
                ..
            })
        ));
    }

    #[test]
    fn test_order_without_lines_fails_validation() {
        let mut builder = MessageBuilder::new(Orders::new(), "S", "R");
        let mut empty = order();
        empty.lines.clear();
        builder.add_message(&empty).unwrap();
        let err = builder.get_or_fail().unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::UnexpectedSegment { ref actual, .. })
                if actual == "UNS"
        ));
    }
}
