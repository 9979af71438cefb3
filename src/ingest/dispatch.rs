use std::collections::HashSet;

use bytes::Bytes;
use tracing::debug;

use crate::error::{Result, RouteError};
use crate::ingest::input::parse_text;
use crate::ingest::splitter::LineSplitter;
use crate::policy::{column_family, AttrNumber};
use crate::shard::{RouterContext, SegmentId};
use crate::types::{Datum, TypeFamily};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Split only up to the last field routing needs and forward the line
    DispatchOnly,
    /// Split and validate every field
    Full,
}

/// A routed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchedRow {
    pub segment: SegmentId,
    /// The input line, unchanged
    pub line: Bytes,
    /// Fields split before routing
    pub parsed_fields: usize,
}

/// Routes delimited text lines of a bulk load to segments.
///
/// Input columns missing from the line's column list route as NULL. In
/// dispatch-only mode the tail of each line past the last routing field is
/// never looked at, so malformed data there is left for the receiving
/// segment to reject.
pub struct RowDispatcher<'a> {
    context: RouterContext<'a>,
    splitter: LineSplitter,
    columns: Vec<AttrNumber>,
    /// Family to convert each input position with, when routing reads it
    conversions: Vec<Option<TypeFamily>>,
    stop_after: Option<usize>,
    values: Vec<Option<Datum>>,
}

impl<'a> RowDispatcher<'a> {
    pub fn new(
        context: RouterContext<'a>,
        splitter: LineSplitter,
        columns: Vec<AttrNumber>,
        mode: ParseMode,
    ) -> Result<Self> {
        let relid = context.root_policy().relid();
        let desc = context
            .catalog()
            .tuple_desc(relid)
            .ok_or_else(|| RouteError::InvalidPolicy(format!("unknown relation {}", relid)))?;

        let mut seen = HashSet::with_capacity(columns.len());
        let mut conversions = Vec::with_capacity(columns.len());
        for &attno in &columns {
            let attr = desc.attr(attno).filter(|attr| !attr.dropped).ok_or_else(|| {
                RouteError::BadRowFormat(format!("relation {} has no column {}", relid, attno))
            })?;
            if !seen.insert(attno) {
                return Err(RouteError::BadRowFormat(format!(
                    "column {} specified more than once",
                    attno
                )));
            }
            if !context.routing_attrs().contains(&attno) {
                conversions.push(None);
                continue;
            }
            let family = column_family(context.catalog(), attr)
                .ok_or(RouteError::NotHashable(attr.type_oid))?;
            conversions.push(Some(family));
        }

        let stop_after = match mode {
            ParseMode::DispatchOnly => Some(
                context
                    .last_needed_column(&columns)
                    .map_or(0, |pos| pos as usize),
            ),
            ParseMode::Full => None,
        };
        debug!(relid, columns = columns.len(), ?stop_after, "row dispatcher ready");

        Ok(Self {
            values: vec![None; desc.natts()],
            context,
            splitter,
            columns,
            conversions,
            stop_after,
        })
    }

    /// Route one input line.
    pub fn dispatch(&mut self, line: Bytes) -> Result<DispatchedRow> {
        let split = self.splitter.split(&line, self.columns.len(), self.stop_after)?;

        self.values.iter_mut().for_each(|v| *v = None);
        for (pos, field) in split.fields.iter().enumerate() {
            if let (Some(family), Some(raw)) = (self.conversions[pos], field) {
                let attno = self.columns[pos];
                self.values[attno as usize - 1] = Some(parse_text(family, raw)?);
            }
        }

        let segment = self.context.route(&self.values)?;
        Ok(DispatchedRow {
            segment,
            line,
            parsed_fields: split.fields.len(),
        })
    }

    /// Fields split per line in dispatch-only mode, `None` in full mode.
    pub fn parse_bound(&self) -> Option<usize> {
        self.stop_after
    }

    pub fn context(&self) -> &RouterContext<'a> {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut RouterContext<'a> {
        &mut self.context
    }

    pub fn into_context(self) -> RouterContext<'a> {
        self.context
    }
}
