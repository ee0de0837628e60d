//! Request query-string decoding.
//!
//! `?embed=events,role&pointsMin=1&house=red` becomes a [`RelationRequest`]
//! and a list of filter [`Clause`]s.

use std::collections::BTreeMap;

use percent_encoding::percent_decode_str;

use crate::filters::{self, Clause};
use crate::relations::{self, RelationRequest};

/// Relation selection parameter.
pub const EMBED: &str = "embed";
/// Older spelling of [`EMBED`], honored when `embed` is absent.
pub const INCLUDE: &str = "include";

/// Decoded request-scoped query values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestQuery {
    pub relations: RelationRequest,
    pub filters: Vec<Clause>,
}

impl RequestQuery {
    /// Decodes an `application/x-www-form-urlencoded` query string, with or
    /// without the leading `?`.
    ///
    /// When a key repeats, the last value wins.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        let mut params: BTreeMap<String, String> = raw
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((key, value)) => (decode(key), decode(value)),
                None => (decode(pair), String::new()),
            })
            .collect();
        Self::from_params(&mut params)
    }

    /// Consumes the relation selection key from already decoded parameters
    /// and parses the rest as filters.
    pub fn from_params(params: &mut BTreeMap<String, String>) -> Self {
        let embed = params.remove(EMBED);
        let include = params.remove(INCLUDE);
        let relations = relations::select(embed.or(include).as_deref());

        Self {
            relations,
            filters: filters::parse(params),
        }
    }
}

fn decode(component: &str) -> String {
    let spaced = component.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}
