//! Main "ruler" for making voices and moving through score.
//!
//! TimeMap answers one question: which measure is under the given
//! position and where are its bounds. It is total: positions beyond the
//! last known measure repeat its time signature, positions before the
//! first one belong to it.
use fraction::Fraction;
use serde::{Deserialize, Serialize};

use crate::{
    error::{DomError, DomResult},
    lilypond_render::RendersToLilypond,
};

use super::{fraction_tools::denom, fraction_tools::numer, Length};

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct TimeSignature {
    pub numerator: u32,
    pub denominator: u32,
}
impl TimeSignature {
    pub fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }
    /// Length of the measure in whole notes.
    pub fn length(&self) -> Fraction {
        Fraction::new(self.numerator, self.denominator.max(1))
    }
}
impl RendersToLilypond for TimeSignature {
    fn render_lilypond(&self) -> String {
        let (num, denom) = (self.numerator, self.denominator);
        format!(r"\time {num}/{denom}")
    }
}

pub type TimeMapMeasures = Vec<MeasureInfo>;

/// Represents area of timeline, that should be exported.
///
/// Considered to be used as reference for building voices, navigating
/// through them and converting positions from absolute to relative.
#[derive(Debug)]
pub struct TimeMap {
    /// measures, following one by one (1-based indexes)
    measures: TimeMapMeasures,
    /// start measure of TimeMap
    begin: u32,
    /// end measure of TimeMap
    end: u32,
    /// start position of the first measure in map (whole notes)
    start_position: Fraction,
    /// absolute start of every measure
    starts: Vec<Fraction>,
}
impl TimeMap {
    /// Measures are expected to follow one by one, starting from the
    /// first measure index.
    pub fn new(
        measures: TimeMapMeasures,
        start_position: Fraction,
    ) -> DomResult<Self> {
        let begin = measures.first().ok_or(DomError::EmptyTimeMap)?.index;
        let end = begin + measures.len() as u32 - 1;
        let mut starts = Vec::with_capacity(measures.len());
        let mut counted_abs = start_position;
        for measure in measures.iter() {
            starts.push(counted_abs);
            counted_abs = counted_abs + measure.length.get();
        }
        Ok(Self {
            measures,
            begin,
            end,
            start_position,
            starts,
        })
    }

    /// Build map from consequent time signatures, the first one gets
    /// `begin` index.
    pub fn from_time_signatures(
        begin: u32,
        time_signatures: impl IntoIterator<Item = TimeSignature>,
        start_position: Fraction,
    ) -> DomResult<Self> {
        let measures = time_signatures
            .into_iter()
            .enumerate()
            .map(|(idx, ts)| MeasureInfo::new(begin + idx as u32, ts))
            .collect();
        Self::new(measures, start_position)
    }

    fn last(&self) -> (&MeasureInfo, Fraction) {
        let idx = self.measures.len() - 1;
        (&self.measures[idx], self.starts[idx])
    }

    /// Get absolute position of measure start.
    /// Index is 1-based.
    pub fn get_absolute_position_of_measure(
        &self,
        measure_index: u32,
    ) -> Fraction {
        if measure_index <= self.begin {
            return self.start_position;
        }
        if measure_index <= self.end {
            return self.starts[(measure_index - self.begin) as usize];
        }
        let (last, last_start) = self.last();
        let over = Fraction::new(measure_index - self.end, 1u32);
        last_start + last.length.get() * over
    }

    /// Get measure under given position.
    ///
    ///  # Returns
    /// MeasureInfo block and absolute position of its start.
    pub fn get_measure_from_absolute_position(
        &self,
        absolute: Fraction,
    ) -> (MeasureInfo, Fraction) {
        if absolute < self.start_position {
            return (self.measures[0].clone(), self.start_position);
        }
        let idx = self.starts.partition_point(|start| *start <= absolute) - 1;
        let (last, last_start) = self.last();
        let last_end = last_start + last.length.get();
        if idx + 1 < self.measures.len() || absolute < last_end {
            return (self.measures[idx].clone(), self.starts[idx]);
        }
        let whole_bars = (absolute - last_end) / last.length.get();
        let count = numer(&whole_bars) / denom(&whole_bars);
        let index = self.end + 1 + count as u32;
        (
            MeasureInfo::new(index, last.time_signature),
            self.get_absolute_position_of_measure(index),
        )
    }

    /// Bounds of measure under the given position in quarter notes.
    ///
    /// # Returns
    /// (measure index, measure start, measure end)
    pub fn measure_bounds(&self, beats: Fraction) -> (u32, Fraction, Fraction) {
        let four = Fraction::new(4u64, 1u64);
        let (info, start) =
            self.get_measure_from_absolute_position(beats / four);
        let end = start + info.length.get();
        (info.index, start * four, end * four)
    }

    pub fn get_measure_info(&self, measure_index: u32) -> MeasureInfo {
        if measure_index <= self.begin {
            return self.measures[0].clone();
        }
        if measure_index <= self.end {
            return self.measures[(measure_index - self.begin) as usize].clone();
        }
        MeasureInfo::new(measure_index, self.last().0.time_signature)
    }

    /// Positions of the first measure and every time signature change.
    pub fn time_signature_changes(&self) -> Vec<(Fraction, TimeSignature)> {
        let mut changes = Vec::new();
        let mut current: Option<TimeSignature> = None;
        for (measure, start) in self.measures.iter().zip(self.starts.iter()) {
            if current != Some(measure.time_signature) {
                changes.push((*start, measure.time_signature));
                current = Some(measure.time_signature);
            }
        }
        changes
    }

    pub fn get(&self) -> &TimeMapMeasures {
        &self.measures
    }
    pub fn start_position(&self) -> Fraction {
        self.start_position
    }
    pub fn begin_measure(&self) -> u32 {
        self.begin
    }
    pub fn end_measure(&self) -> u32 {
        self.end
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct MeasureInfo {
    pub index: u32,
    pub time_signature: TimeSignature,
    pub length: Length,
}
impl MeasureInfo {
    pub fn new(index: u32, time_signature: TimeSignature) -> Self {
        let length = Length::from(&time_signature);
        Self {
            index,
            time_signature,
            length,
        }
    }
}
