// profile-server/src/aggregator.rs
use common::models::{AccessToken, ListeningProfile};
use common::AppResult;
use tokio_util::sync::CancellationToken;
use crate::spotify::{SpotifyApi, TimeRange};

const HYPE_ARTIST_LIMIT: usize = 1;

/// Run the four provider reads concurrently and reduce them into a profile.
///
/// All four must succeed: the first failure drops the remaining requests
/// and fails the whole aggregation.
pub async fn fetch_listening_profile(
    api: &dyn SpotifyApi,
    token: &AccessToken,
    cancel: &CancellationToken,
) -> AppResult<ListeningProfile> {
    let (profile, top_artists, top_tracks, recent_artists) = futures::try_join!(
        api.current_user(token, cancel),
        api.top_artists(token, TimeRange::LongTerm, ListeningProfile::TOP_ARTISTS_LIMIT, cancel),
        api.top_tracks(token, TimeRange::LongTerm, ListeningProfile::TOP_TRACKS_LIMIT, cancel),
        api.top_artists(token, TimeRange::ShortTerm, HYPE_ARTIST_LIMIT, cancel),
    )?;

    tracing::debug!(
        "Aggregated {} top artists and {} top tracks for {}",
        top_artists.len(),
        top_tracks.len(),
        profile.id
    );

    Ok(ListeningProfile::assemble(profile, top_artists, top_tracks, recent_artists))
}


#[cfg(test)]
mod tests {
    use super::fakes::FakeSpotify;
    use super::*;
    use async_trait::async_trait;
    use common::models::{Artist, Image, SpotifyProfile, Track};
    use common::AppError;
    use std::time::Duration;
    use tokio::sync::Barrier;

    fn token() -> AccessToken {
        AccessToken::new("tok")
    }

    #[tokio::test]
    async fn builds_profile_from_four_reads() {
        let api = FakeSpotify::new(5, 1, 10);

        let profile = fetch_listening_profile(&api, &token(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(profile.top_artists, api.long_term_artists);
        assert_eq!(profile.top_tracks, api.tracks);
        assert_eq!(profile.hype_artist, api.short_term_artists[0]);
        assert_eq!(profile.spotify_profile.id, "listener");

        let mut calls = api.calls.lock().unwrap().clone();
        calls.sort_by(|a, b| format!("{:?}", a).cmp(&format!("{:?}", b)));
        assert_eq!(
            calls,
            vec![
                ("artists".to_string(), Some(TimeRange::LongTerm), Some(5)),
                ("artists".to_string(), Some(TimeRange::ShortTerm), Some(1)),
                ("me".to_string(), None, None),
                ("tracks".to_string(), Some(TimeRange::LongTerm), Some(10)),
            ]
        );
    }

    #[tokio::test]
    async fn empty_short_term_window_yields_placeholder() {
        let api = FakeSpotify::new(5, 0, 10);

        let profile = fetch_listening_profile(&api, &token(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(profile.hype_artist.name, "None");
        assert_eq!(profile.hype_artist.images, vec![Image::from_url("-")]);
    }

    #[tokio::test]
    async fn any_failed_read_fails_the_aggregation() {
        let mut api = FakeSpotify::new(5, 1, 10);
        api.fail_tracks = true;

        let result = fetch_listening_profile(&api, &token(), &CancellationToken::new()).await;
        assert!(matches!(result, Err(AppError::UpstreamFailure(_))));
    }

    #[tokio::test]
    async fn cancellation_aborts_the_aggregation() {
        let mut api = FakeSpotify::new(5, 1, 10);
        api.hang = true;
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let result = fetch_listening_profile(&api, &token(), &cancel).await;
        assert_eq!(result, Err(AppError::Cancelled));
    }

    /// Every call waits until all four have started
    struct RendezvousSpotify {
        barrier: Barrier,
    }

    #[async_trait(?Send)]
    impl SpotifyApi for RendezvousSpotify {
        async fn current_user(&self, _: &AccessToken, _: &CancellationToken) -> AppResult<SpotifyProfile> {
            self.barrier.wait().await;
            Ok(super::fakes::profile())
        }

        async fn top_artists(&self, _: &AccessToken, _: TimeRange, _: usize, _: &CancellationToken) -> AppResult<Vec<Artist>> {
            self.barrier.wait().await;
            Ok(Vec::new())
        }

        async fn top_tracks(&self, _: &AccessToken, _: TimeRange, _: usize, _: &CancellationToken) -> AppResult<Vec<Track>> {
            self.barrier.wait().await;
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn reads_run_concurrently() {
        let api = RendezvousSpotify { barrier: Barrier::new(4) };

        let result = tokio::time::timeout(
            Duration::from_secs(2),
            fetch_listening_profile(&api, &token(), &CancellationToken::new()),
        )
        .await
        .expect("reads were issued one after another");

        let profile = result.unwrap();
        assert!(profile.top_artists.is_empty());
        assert_eq!(profile.hype_artist.name, "None");
    }
}
