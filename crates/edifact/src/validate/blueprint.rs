//! Segment-order state machine.
//!
//! A [`Blueprint`] walks a [`BlueprintSpec`] in lockstep with a segment
//! stream. It keeps one frame per entered loop; each frame holds the loop
//! body and a cursor into it. For each incoming tag it repeats, until the tag
//! is matched or rejected:
//!
//! ```text
//! skip      optional segment that differs / optional loop that cannot start here
//! enter     cursor on a loop            -> push frame, cursor 0
//! repeat    end of loop body, body can start with tag -> cursor 0
//! exit      end of loop body otherwise  -> pop frame, step past the loop
//! match     cursor on a segment entry   -> equal tags advance, else fail
//! ```

use tracing::trace;

use crate::error::ValidationError;
use crate::model::Segment;
use crate::validate::spec::{BlueprintNode, BlueprintSpec, can_start};

#[derive(Debug, Clone, Copy)]
struct Frame<'s> {
    body: &'s [BlueprintNode],
    cursor: usize,
}

/// Single-use validator for one pass over one segment stream.
///
/// After the first rejection the blueprint stays failed and returns the same
/// error for every later segment.
#[derive(Debug, Clone)]
pub struct Blueprint<'s> {
    frames: Vec<Frame<'s>>,
    consumed: usize,
    failure: Option<ValidationError>,
}

impl<'s> Blueprint<'s> {
    pub fn new(spec: &'s BlueprintSpec) -> Self {
        Self {
            frames: vec![Frame {
                body: spec.nodes(),
                cursor: 0,
            }],
            consumed: 0,
            failure: None,
        }
    }

    /// Current loop depth (0 at the top level).
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    /// Number of segments fed so far, including a rejected one.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Accepts or rejects the next segment.
    pub fn validate(&mut self, segment: &Segment) -> Result<(), ValidationError> {
        self.accept(segment.tag())
    }

    /// Accepts or rejects the next segment tag.
    pub fn accept(&mut self, tag: &str) -> Result<(), ValidationError> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        self.consumed += 1;
        let result = self.step(tag);
        if let Err(e) = &result {
            self.failure = Some(e.clone());
        }
        result
    }

    fn step(&mut self, tag: &str) -> Result<(), ValidationError> {
        loop {
            let top = self.frames.len() - 1;
            let Frame { body, mut cursor } = self.frames[top];

            while let Some(node) = body.get(cursor) {
                let skip = match node {
                    BlueprintNode::Segment { tag: expected, necessity } => {
                        necessity.is_optional() && expected != tag
                    }
                    BlueprintNode::Loop { necessity, body } => {
                        necessity.is_optional() && !can_start(body, tag)
                    }
                };
                if !skip {
                    break;
                }
                cursor += 1;
            }
            self.frames[top].cursor = cursor;

            match body.get(cursor) {
                Some(BlueprintNode::Loop { body: inner, .. }) => {
                    trace!(depth = top + 1, tag, "entering loop");
                    self.frames.push(Frame { body: inner, cursor: 0 });
                }
                Some(BlueprintNode::Segment { tag: expected, .. }) => {
                    if expected != tag {
                        return Err(self.unexpected(Some(expected), tag));
                    }
                    self.frames[top].cursor += 1;
                    return Ok(());
                }
                None if top == 0 => return Err(self.unexpected(None, tag)),
                None if can_start(body, tag) => {
                    trace!(depth = top, tag, "repeating loop");
                    self.frames[top].cursor = 0;
                }
                None => {
                    trace!(depth = top, tag, "leaving loop");
                    self.frames.pop();
                    self.frames[top - 1].cursor += 1;
                }
            }
        }
    }

    fn unexpected(&self, expected: Option<&String>, actual: &str) -> ValidationError {
        ValidationError::UnexpectedSegment {
            expected: expected.cloned(),
            actual: actual.to_string(),
            position: self.consumed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::spec::BlueprintNode as N;

    fn run(spec: &BlueprintSpec, tags: &[&str]) -> Result<(), ValidationError> {
        let mut blueprint = Blueprint::new(spec);
        for tag in tags {
            blueprint.accept(tag)?;
        }
        Ok(())
    }

    fn abc() -> BlueprintSpec {
        BlueprintSpec::new(vec![
            N::mandatory("AAA"),
            N::optional_loop(vec![N::mandatory("BBB")]),
            N::mandatory("CCC"),
        ])
    }

    #[test]
    fn test_optional_loop_absent() {
        assert!(run(&abc(), &["AAA", "CCC"]).is_ok());
    }

    #[test]
    fn test_loop_repeats() {
        assert!(run(&abc(), &["AAA", "BBB", "CCC"]).is_ok());
        assert!(run(&abc(), &["AAA", "BBB", "BBB", "CCC"]).is_ok());
    }

    #[test]
    fn test_unexpected_segment() {
        assert_eq!(
            run(&abc(), &["AAA", "DDD"]),
            Err(ValidationError::UnexpectedSegment {
                expected: Some("CCC".to_string()),
                actual: "DDD".to_string(),
                position: 2,
            })
        );
        assert_eq!(
            run(&abc(), &["BBB"]),
            Err(ValidationError::UnexpectedSegment {
                expected: Some("AAA".to_string()),
                actual: "BBB".to_string(),
                position: 1,
            })
        );
    }

    #[test]
    fn test_segment_after_end() {
        assert_eq!(
            run(&abc(), &["AAA", "CCC", "CCC"]),
            Err(ValidationError::UnexpectedSegment {
                expected: None,
                actual: "CCC".to_string(),
                position: 3,
            })
        );
    }

    #[test]
    fn test_optional_segments_skipped() {
        let spec = BlueprintSpec::new(vec![
            N::mandatory("UNH"),
            N::optional("DTM"),
            N::optional("FTX"),
            N::mandatory("UNT"),
        ]);
        assert!(run(&spec, &["UNH", "UNT"]).is_ok());
        assert!(run(&spec, &["UNH", "FTX", "UNT"]).is_ok());
        assert!(run(&spec, &["UNH", "DTM", "FTX", "UNT"]).is_ok());
        // order still matters
        assert!(run(&spec, &["UNH", "FTX", "DTM", "UNT"]).is_err());
    }

    #[test]
    fn test_nested_loops() {
        let spec = BlueprintSpec::new(vec![
            N::mandatory("UNB"),
            N::mandatory_loop(vec![
                N::mandatory("UNH"),
                N::optional_loop(vec![
                    N::mandatory("NAD"),
                    N::optional_loop(vec![N::mandatory("CTA"), N::optional("COM")]),
                ]),
                N::mandatory_loop(vec![N::mandatory("LIN"), N::optional("QTY")]),
                N::mandatory("UNT"),
            ]),
            N::mandatory("UNZ"),
        ]);

        let tags = [
            "UNB", "UNH", "NAD", "CTA", "COM", "CTA", "NAD", "LIN", "QTY", "LIN", "UNT", "UNH",
            "LIN", "UNT", "UNZ",
        ];
        let mut blueprint = Blueprint::new(&spec);
        let mut max_depth = 0;
        for tag in tags {
            blueprint.accept(tag).unwrap();
            max_depth = max_depth.max(blueprint.depth());
            assert!(blueprint.depth() <= spec.depth());
        }
        assert_eq!(max_depth, 3);
        assert_eq!(blueprint.depth(), 0);
        assert_eq!(blueprint.consumed(), tags.len());
    }

    #[test]
    fn test_mandatory_loop_required() {
        let spec = BlueprintSpec::new(vec![
            N::mandatory("UNH"),
            N::mandatory_loop(vec![N::mandatory("LIN"), N::mandatory("QTY")]),
            N::mandatory("UNT"),
        ]);
        assert!(matches!(
            run(&spec, &["UNH", "UNT"]),
            Err(ValidationError::UnexpectedSegment { expected: Some(ref e), position: 2, .. })
                if e == "LIN"
        ));
        assert!(matches!(
            run(&spec, &["UNH", "LIN", "UNT"]),
            Err(ValidationError::UnexpectedSegment { expected: Some(ref e), .. }) if e == "QTY"
        ));
    }

    #[test]
    fn test_loop_with_optional_head() {
        let spec = BlueprintSpec::new(vec![
            N::mandatory("UNH"),
            N::optional_loop(vec![N::optional("RFF"), N::mandatory("DTM")]),
            N::mandatory("UNT"),
        ]);
        assert!(run(&spec, &["UNH", "DTM", "RFF", "DTM", "UNT"]).is_ok());
        assert!(run(&spec, &["UNH", "RFF", "DTM", "DTM", "UNT"]).is_ok());
    }

    #[test]
    fn test_failure_is_sticky() {
        let spec = abc();
        let mut blueprint = Blueprint::new(&spec);
        blueprint.accept("AAA").unwrap();
        let first = blueprint.accept("XXX").unwrap_err();
        assert_eq!(blueprint.accept("CCC").unwrap_err(), first);
        assert_eq!(blueprint.consumed(), 2);
    }
}
