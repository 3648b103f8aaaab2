//! Snow accumulation queries with a per-region incremental cursor.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use bevy::prelude::*;

use crate::calendar::GameDate;
use crate::config::SnowConfig;
use crate::error::{ReplayGap, WeatherError};
use crate::region::Region;
use crate::weather::WeatherSource;

use super::accumulation::{epoch_for, AccumulationState};
use super::types::{HourRecord, SnowState};

/// Answers snow queries by replaying weather from the season epoch.
///
/// Each region keeps one cursor: the replay state at the last hour it was
/// asked about. Later queries with the same replay start continue from the
/// cursor; earlier ones, or ones past a season start, replay again from
/// their own start. Both paths run the same `apply_hour` sequence, so the result is
/// identical to `replay_from_epoch`.
pub struct SnowAccumulationService {
    source: Arc<dyn WeatherSource>,
    config: SnowConfig,
    cursors: RwLock<HashMap<String, Arc<Mutex<AccumulationState>>>>,
}

impl SnowAccumulationService {
    pub fn new(source: Arc<dyn WeatherSource>, config: SnowConfig) -> Self {
        Self {
            source,
            config,
            cursors: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &SnowConfig {
        &self.config
    }

    pub fn get_accumulation(
        &self,
        region: &Region,
        date: GameDate,
    ) -> Result<SnowState, WeatherError> {
        date.validate()?;
        let Some(epoch) = epoch_for(self.config.epoch, date)? else {
            return Ok(SnowState::bare());
        };
        let target = date.to_linear_hour();

        let cursor = self.cursor(&region.id);
        let mut state = cursor.lock().unwrap_or_else(PoisonError::into_inner);
        if state.epoch != epoch || state.next_hour > target + 1 {
            *state = AccumulationState::new(epoch, &self.config);
        }
        state.advance_to(target, region, self.source.as_ref(), &self.config);
        Ok(state.snow_state(&self.config))
    }

    /// Full replay from the epoch that neither reads nor moves the cursor.
    pub fn replay_from_epoch(
        &self,
        region: &Region,
        date: GameDate,
    ) -> Result<SnowState, WeatherError> {
        date.validate()?;
        let Some(epoch) = epoch_for(self.config.epoch, date)? else {
            return Ok(SnowState::bare());
        };
        let mut state = AccumulationState::new(epoch, &self.config);
        state.advance_to(date.to_linear_hour(), region, self.source.as_ref(), &self.config);
        Ok(state.snow_state(&self.config))
    }

    /// Per-hour records for `from..=to`. Hours before the replay start of
    /// `to` are not returned.
    pub fn history(
        &self,
        region: &Region,
        from: GameDate,
        to: GameDate,
    ) -> Result<Vec<HourRecord>, WeatherError> {
        from.validate()?;
        to.validate()?;
        if from > to {
            return Ok(Vec::new());
        }
        let Some(epoch) = epoch_for(self.config.epoch, to)? else {
            return Ok(Vec::new());
        };
        let from_hour = from.to_linear_hour().max(epoch.to_linear_hour());
        let to_hour = to.to_linear_hour();
        let span = (to_hour - from_hour + 1) as usize;

        if span > self.config.history_window_hours {
            return Ok(self.replay_records(region, epoch, from_hour, to_hour));
        }

        let cursor = self.cursor(&region.id);
        let mut state = cursor.lock().unwrap_or_else(PoisonError::into_inner);
        if state.epoch != epoch || (state.next_hour > to_hour + 1 && !state.covers(from_hour, to_hour)) {
            *state = AccumulationState::new(epoch, &self.config);
        }
        state.advance_to(to_hour, region, self.source.as_ref(), &self.config);
        Ok(state.records(from_hour, to_hour))
    }

    /// Gaps recorded by the region's cursor since its epoch.
    pub fn replay_gaps(&self, region_id: &str) -> Vec<ReplayGap> {
        let cursors = self.cursors.read().unwrap_or_else(PoisonError::into_inner);
        cursors.get(region_id).map_or_else(Vec::new, |cursor| {
            cursor
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .gaps
                .clone()
        })
    }

    /// The last hour the region's cursor has evaluated.
    pub fn cursor_date(&self, region_id: &str) -> Option<GameDate> {
        let cursors = self.cursors.read().unwrap_or_else(PoisonError::into_inner);
        let cursor = cursors.get(region_id)?;
        let state = cursor.lock().unwrap_or_else(PoisonError::into_inner);
        (state.next_hour > state.epoch.to_linear_hour())
            .then(|| GameDate::from_linear_hour(state.next_hour - 1))
    }

    pub fn clear_cache(&self, region_id: Option<&str>) {
        let mut cursors = self.cursors.write().unwrap_or_else(PoisonError::into_inner);
        match region_id {
            Some(id) => {
                if cursors.remove(id).is_some() {
                    debug!("snow cursor for region '{}' cleared", id);
                }
            }
            None => {
                debug!("clearing {} snow cursors", cursors.len());
                cursors.clear();
            }
        }
    }

    fn cursor(&self, region_id: &str) -> Arc<Mutex<AccumulationState>> {
        if let Some(cursor) = self
            .cursors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(region_id)
        {
            return Arc::clone(cursor);
        }
        let mut cursors = self.cursors.write().unwrap_or_else(PoisonError::into_inner);
        let cursor = cursors.entry(region_id.to_string()).or_insert_with(|| {
            // Placeholder epoch; the first query resets it.
            Arc::new(Mutex::new(AccumulationState::new(
                GameDate::from_linear_hour(0),
                &self.config,
            )))
        });
        Arc::clone(cursor)
    }

    fn replay_records(
        &self,
        region: &Region,
        epoch: GameDate,
        from_hour: i64,
        to_hour: i64,
    ) -> Vec<HourRecord> {
        let mut state = AccumulationState::new(epoch, &self.config);
        let mut out = Vec::with_capacity((to_hour - from_hour + 1).max(0) as usize);
        while state.next_hour <= to_hour {
            let record = state.apply_hour(region, self.source.as_ref(), &self.config);
            if record.hour >= from_hour {
                out.push(record);
            }
        }
        out
    }
}
