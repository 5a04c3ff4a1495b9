//! Interchange service segment layouts (UNA, UNB, UNH, UNT, UNZ).

use crate::model::segment::Format::{Alpha, Alphanumeric, Numeric};
use crate::model::segment::{ComponentRule as C, ElementRule as E, SegmentDef, tags};

/// Service string advice. Its single element is the six-character service string.
pub static UNA: SegmentDef =
    SegmentDef::new(tags::UNA, &[E::mandatory(&[C::mandatory(Alphanumeric, 6)])]);

/// Interchange header.
pub static UNB: SegmentDef = SegmentDef::new(
    tags::UNB,
    &[
        // syntax identifier : version
        E::mandatory(&[C::mandatory(Alphanumeric, 4), C::mandatory(Numeric, 1)]),
        // sender : code qualifier : internal id
        E::mandatory(&[
            C::mandatory(Alphanumeric, 35),
            C::optional(Alphanumeric, 4),
            C::optional(Alphanumeric, 35),
        ]),
        // recipient : code qualifier : internal id
        E::mandatory(&[
            C::mandatory(Alphanumeric, 35),
            C::optional(Alphanumeric, 4),
            C::optional(Alphanumeric, 35),
        ]),
        // date : time
        E::mandatory(&[C::mandatory(Numeric, 8), C::mandatory(Numeric, 4)]),
        // interchange control reference
        E::mandatory(&[C::mandatory(Alphanumeric, 14)]),
        E::optional(&[C::mandatory(Alphanumeric, 14), C::optional(Alphanumeric, 2)]),
        E::optional(&[C::mandatory(Alphanumeric, 14)]),
        E::optional(&[C::mandatory(Alpha, 1)]),
        E::optional(&[C::mandatory(Numeric, 1)]),
        E::optional(&[C::mandatory(Alphanumeric, 35)]),
        // test indicator
        E::optional(&[C::mandatory(Numeric, 1)]),
    ],
);

/// Message header.
pub static UNH: SegmentDef = SegmentDef::new(
    tags::UNH,
    &[
        E::mandatory(&[C::mandatory(Alphanumeric, 14)]),
        // type : version : release : agency : association code
        E::mandatory(&[
            C::mandatory(Alphanumeric, 6),
            C::mandatory(Alphanumeric, 3),
            C::mandatory(Alphanumeric, 3),
            C::mandatory(Alphanumeric, 3),
            C::optional(Alphanumeric, 6),
        ]),
        E::optional(&[C::mandatory(Alphanumeric, 35)]),
        E::optional(&[C::mandatory(Numeric, 2), C::optional(Alpha, 1)]),
    ],
);

/// Message trailer: segment count and message reference.
pub static UNT: SegmentDef = SegmentDef::new(
    tags::UNT,
    &[
        E::mandatory(&[C::mandatory(Numeric, 10)]),
        E::mandatory(&[C::mandatory(Alphanumeric, 14)]),
    ],
);

/// Interchange trailer: message count and interchange reference.
pub static UNZ: SegmentDef = SegmentDef::new(
    tags::UNZ,
    &[
        E::mandatory(&[C::mandatory(Numeric, 6)]),
        E::mandatory(&[C::mandatory(Alphanumeric, 14)]),
    ],
);

pub static ALL: [&SegmentDef; 5] = [&UNA, &UNB, &UNH, &UNT, &UNZ];
