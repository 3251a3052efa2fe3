use std::collections::HashSet;

use crate::error::SyncError;
use crate::ports::spotify::{PlaylistRecord, SpotifyClient};
use crate::services::track::SavedTrack;

/// What `ensure_track_present` did for one track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    Added,
    AlreadyPresent,
}

/// One month playlist, mirrored locally.
///
/// Member track ids load lazily on the first `ensure_track_present` call and
/// stay loaded for the rest of the run; the set is not re-validated against
/// the remote side within a run.
#[derive(Debug)]
pub struct PlaylistBucket {
    id: String,
    name: String,
    members: Option<HashSet<String>>,
}

impl PlaylistBucket {
    pub fn new(record: PlaylistRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            members: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add `track` to the remote playlist unless it is already a member.
    ///
    /// At most one remote mutation per genuinely-new track; repeated calls
    /// with the same track within a run are no-ops. A failed member load
    /// leaves the bucket unloaded and the remote playlist untouched.
    pub async fn ensure_track_present<C: SpotifyClient>(
        &mut self,
        client: &C,
        track: &SavedTrack,
    ) -> Result<EnsureOutcome, SyncError> {
        let members = match self.members {
            Some(ref mut members) => members,
            None => {
                let loaded = Self::load_members(client, &self.id, &self.name).await?;
                self.members.insert(loaded)
            }
        };

        if members.contains(&track.id) {
            tracing::info!("'{}' already in '{}'", track.name, self.name);
            return Ok(EnsureOutcome::AlreadyPresent);
        }

        client
            .add_tracks_to_playlist(&self.id, std::slice::from_ref(&track.id))
            .await
            .map_err(|err| SyncError::Insertion {
                playlist: self.name.clone(),
                track: track.name.clone(),
                reason: format!("{err:#}"),
            })?;

        tracing::info!("'{}' added to '{}'", track.name, self.name);
        members.insert(track.id.clone());
        Ok(EnsureOutcome::Added)
    }

    /// Fetch all member track ids in one page request. Playlists longer than
    /// the service page size come back truncated; the resulting duplicate-add
    /// attempts are left for the remote side to reject.
    async fn load_members<C: SpotifyClient>(
        client: &C,
        id: &str,
        name: &str,
    ) -> Result<HashSet<String>, SyncError> {
        let items = client
            .playlist_tracks(id)
            .await
            .map_err(|err| SyncError::Load {
                playlist: name.to_string(),
                reason: format!("{err:#}"),
            })?;

        Ok(items.into_iter().filter_map(|item| item.track_id).collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use color_eyre::eyre::eyre;

    use super::*;
    use crate::ports::spotify::{MockSpotifyClient, SavedTrackRecord};

    fn bucket() -> PlaylistBucket {
        PlaylistBucket::new(PlaylistRecord {
            id: "pl1".into(),
            name: "Jan '24".into(),
        })
    }

    fn track(id: &str) -> SavedTrack {
        SavedTrack {
            id: id.into(),
            name: format!("Song {id}"),
            added_at: Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap(),
        }
    }

    fn member_record(id: &str) -> SavedTrackRecord {
        SavedTrackRecord {
            added_at: "2024-01-02T00:00:00Z".into(),
            track_id: Some(id.into()),
            track_name: Some(format!("Song {id}")),
        }
    }

    #[tokio::test]
    async fn test_repeated_ensure_issues_one_mutation() {
        let mut client = MockSpotifyClient::new();
        client
            .expect_playlist_tracks()
            .times(1)
            .returning(|_| Ok(vec![]));
        client
            .expect_add_tracks_to_playlist()
            .withf(|id, tracks| id == "pl1" && tracks == ["t1"])
            .times(1)
            .returning(|_, _| Ok(()));

        let mut bucket = bucket();
        let first = bucket.ensure_track_present(&client, &track("t1")).await;
        let second = bucket.ensure_track_present(&client, &track("t1")).await;

        assert_eq!(first.unwrap(), EnsureOutcome::Added);
        assert_eq!(second.unwrap(), EnsureOutcome::AlreadyPresent);
    }

    #[tokio::test]
    async fn test_remote_member_is_not_re_added() {
        let mut client = MockSpotifyClient::new();
        client
            .expect_playlist_tracks()
            .times(1)
            .returning(|_| Ok(vec![member_record("t1")]));
        client.expect_add_tracks_to_playlist().never();

        let mut bucket = bucket();
        let outcome = bucket
            .ensure_track_present(&client, &track("t1"))
            .await
            .unwrap();

        assert_eq!(outcome, EnsureOutcome::AlreadyPresent);
    }

    #[tokio::test]
    async fn test_load_failure_aborts_without_mutation() {
        let mut client = MockSpotifyClient::new();
        client
            .expect_playlist_tracks()
            .times(1)
            .returning(|_| Err(eyre!("boom")));
        client.expect_add_tracks_to_playlist().never();

        let mut bucket = bucket();
        let err = bucket
            .ensure_track_present(&client, &track("t1"))
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Load { .. }));
    }

    #[tokio::test]
    async fn test_bucket_stays_unloaded_after_load_failure() {
        let mut client = MockSpotifyClient::new();
        client
            .expect_playlist_tracks()
            .times(1)
            .returning(|_| Err(eyre!("boom")));
        client
            .expect_playlist_tracks()
            .times(1)
            .returning(|_| Ok(vec![]));
        client
            .expect_add_tracks_to_playlist()
            .times(1)
            .returning(|_, _| Ok(()));

        let mut bucket = bucket();
        bucket
            .ensure_track_present(&client, &track("t1"))
            .await
            .unwrap_err();
        let outcome = bucket
            .ensure_track_present(&client, &track("t1"))
            .await
            .unwrap();

        assert_eq!(outcome, EnsureOutcome::Added);
    }

    #[tokio::test]
    async fn test_add_failure_is_not_cached_as_member() {
        let mut client = MockSpotifyClient::new();
        client
            .expect_playlist_tracks()
            .times(1)
            .returning(|_| Ok(vec![]));
        client
            .expect_add_tracks_to_playlist()
            .times(1)
            .returning(|_, _| Err(eyre!("rate limited")));
        client
            .expect_add_tracks_to_playlist()
            .times(1)
            .returning(|_, _| Ok(()));

        let mut bucket = bucket();
        let err = bucket
            .ensure_track_present(&client, &track("t1"))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Insertion { .. }));

        let outcome = bucket
            .ensure_track_present(&client, &track("t1"))
            .await
            .unwrap();
        assert_eq!(outcome, EnsureOutcome::Added);
    }
}
