use crate::config::AppConfig;
use crate::db::MeetingRepository;
use crate::services::calendar::CalendarGateway;
use crate::services::proposal::ProposalService;

pub struct AppState {
    pub config: AppConfig,
    pub proposals: ProposalService,
    pub calendar: Box<dyn CalendarGateway>,
    pub repository: Box<dyn MeetingRepository>,
}
