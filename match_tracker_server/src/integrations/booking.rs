use booking_tools::{BookingApi, BookingApiError, BookingConfig, MatchDto, MatchSummaryDto, PlayerDto, TeamDto};
use chrono::Utc;
use log::*;
use match_tracker_engine::{
    db_types::{
        GameStatus,
        Match,
        MatchId,
        MatchSummary,
        Player,
        ProcessingStatus,
        ResultsStatus,
        SetResult,
        Team,
        TeamOutcome,
        VenueInfo,
    },
    traits::{BookingPlatform, BookingPlatformError},
};

/// The booking platform, as the engine sees it.
#[derive(Clone)]
pub struct BookingPlatformAdapter {
    api: BookingApi,
}

impl BookingPlatformAdapter {
    pub fn new(config: BookingConfig) -> Result<Self, BookingApiError> {
        let api = BookingApi::new(config)?;
        Ok(Self { api })
    }
}

impl BookingPlatform for BookingPlatformAdapter {
    async fn fetch_match_summaries(&self) -> Result<Vec<MatchSummary>, BookingPlatformError> {
        let summaries = self.api.fetch_match_summaries(Utc::now()).await.map_err(to_platform_error)?;
        Ok(summaries.into_iter().map(summary_from_dto).collect())
    }

    async fn fetch_match(&self, match_id: &MatchId) -> Result<Match, BookingPlatformError> {
        let dto = self.api.fetch_match(match_id.as_str()).await.map_err(|e| match e {
            BookingApiError::MatchNotFound(_) => BookingPlatformError::MatchNotFound(match_id.clone()),
            e => to_platform_error(e),
        })?;
        Ok(match_from_dto(dto))
    }
}

fn to_platform_error(e: BookingApiError) -> BookingPlatformError {
    match e {
        BookingApiError::JsonError(s) => BookingPlatformError::InvalidData(s),
        e => BookingPlatformError::Upstream(e.to_string()),
    }
}

pub fn summary_from_dto(dto: MatchSummaryDto) -> MatchSummary {
    MatchSummary { match_id: MatchId(dto.match_id), owner_id: dto.owner_id }
}

/// Converts the platform's view of a match into a `NEW` match record.
///
/// Unrecognised statuses become `UNKNOWN`. Scores for teams that are not in the match are dropped.
pub fn match_from_dto(dto: MatchDto) -> Match {
    let team_ids = dto.teams.iter().map(|t| t.team_id.clone()).collect::<Vec<_>>();
    let results = dto
        .results
        .into_iter()
        .map(|set| {
            let scores = set
                .scores
                .into_iter()
                .filter(|s| {
                    let known = team_ids.contains(&s.team_id);
                    if !known {
                        debug!("Match {} reports a score for unknown team {}", dto.match_id, s.team_id);
                    }
                    known
                })
                .map(|s| (s.team_id, s.score))
                .collect();
            SetResult { name: set.name, scores }
        })
        .collect();
    let (tenant_id, tenant_name) = dto.tenant.map(|t| (Some(t.tenant_id), Some(t.tenant_name))).unwrap_or_default();
    Match {
        match_id: MatchId(dto.match_id),
        start_date: dto.start_date,
        end_date: dto.end_date,
        created_at: dto.created_at,
        owner_id: dto.owner_id,
        owner_name: dto.owner_name,
        teams: dto.teams.into_iter().map(team_from_dto).collect(),
        results,
        game_status: GameStatus::from_wire(&dto.game_status),
        results_status: ResultsStatus::from_wire(&dto.results_status),
        processing_status: ProcessingStatus::New,
        duty: None,
        venue: VenueInfo {
            resource_name: dto.resource_name,
            price: dto.price,
            access_code: dto.access_code,
            tenant_id,
            tenant_name,
        },
    }
}

fn team_from_dto(dto: TeamDto) -> Team {
    let outcome = dto.team_result.as_deref().and_then(|s| s.to_ascii_uppercase().parse::<TeamOutcome>().ok());
    Team { team_id: dto.team_id, players: dto.players.into_iter().map(player_from_dto).collect(), outcome }
}

fn player_from_dto(dto: PlayerDto) -> Player {
    let paid = dto.paid();
    Player { id: dto.user_id, name: dto.name, level: dto.level_value, paid }
}
