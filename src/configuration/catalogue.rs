//! Built-in capture catalogue for the documented application.
//!
//! Used whenever no flows file is configured. Targets are paths resolved
//! against the configured base URL at run time.

use super::types::{CaptureFlow, Endpoint, FlowCatalogue};

/// Pages fingerprinted by the change detector.
pub fn default_endpoints() -> Vec<Endpoint> {
    vec![
        Endpoint::new("home", "/"),
        Endpoint::new("login", "/login"),
        Endpoint::new("menu", "/menu"),
        Endpoint::new("profile", "/profile"),
    ]
}

pub fn default_flows() -> Vec<CaptureFlow> {
    vec![
        // security
        CaptureFlow::new("HTTPS Evidence - Home", "/", "1_https_evidence.png", "security")
            .viewport_only(),
        CaptureFlow::new(
            "HTTPS - Certificate Info",
            "/cert-info",
            "2_PEM_certificate_https.png",
            "security",
        )
        .optional(),
        // auth
        CaptureFlow::new("Login Page", "/login", "2_login_UI.png", "auth"),
        CaptureFlow::new(
            "Registration Page",
            "/register",
            "3_create_new_account_UI.png",
            "auth",
        ),
        CaptureFlow::new(
            "2FA Verification",
            "/auth/2fa",
            "2_Oauth_2Step_verification.png",
            "auth",
        ),
        CaptureFlow::new(
            "Password Recovery",
            "/forgot-password",
            "3_Forget_Password.png",
            "auth",
        ),
        // gameplay
        CaptureFlow::new("Main Menu", "/menu", "3_Main_Menu.png", "gameplay"),
        CaptureFlow::new(
            "Game Modes Selection",
            "/game-modes",
            "game_modes.png",
            "gameplay",
        ),
        CaptureFlow::new(
            "Game Settings",
            "/game/settings",
            "4_playemode_game_settings.png",
            "gameplay",
        ),
        // arcade
        CaptureFlow::new(
            "Arcade Gameplay",
            "/game/arcade",
            "multiplayer_arcade.png",
            "arcade",
        )
        .viewport_only()
        .with_delay(2_000),
        CaptureFlow::new(
            "Arcade Multiple Players",
            "/game/arcade/multiplayer",
            "arcade_multiple_players.png",
            "arcade",
        )
        .viewport_only()
        .with_delay(2_000)
        .optional(),
        // campaign
        CaptureFlow::new(
            "Campaign Gameplay",
            "/game/campaign",
            "Campaign_game_running.png",
            "campaign",
        )
        .viewport_only()
        .with_delay(2_000),
        CaptureFlow::new(
            "Campaign AI Mode",
            "/game/campaign/ai",
            "coop_campagin_AI_bot.png",
            "campaign",
        )
        .viewport_only()
        .with_delay(2_000)
        .optional(),
        CaptureFlow::new(
            "Campaign Level Up",
            "/game/campaign/level-up",
            "coop_game_level_up.png",
            "campaign",
        )
        .optional(),
        CaptureFlow::new(
            "Campaign Retry",
            "/game/campaign/retry",
            "coop_game_retry.png",
            "campaign",
        )
        .optional(),
        // tournament
        CaptureFlow::new(
            "Tournament Mode",
            "/game/tournament",
            "gamemode_tournament.png",
            "tournament",
        ),
        CaptureFlow::new(
            "Tournament Bracket",
            "/tournament/bracket",
            "tournament_bracket_matches.png",
            "tournament",
        ),
        CaptureFlow::new(
            "Tournament Game",
            "/game/tournament/match",
            "tournament_game.png",
            "tournament",
        )
        .viewport_only()
        .with_delay(2_000)
        .optional(),
        CaptureFlow::new(
            "Tournament Match Result",
            "/tournament/result",
            "11_tournament_match_result.png",
            "tournament",
        )
        .optional(),
        CaptureFlow::new(
            "Tournament Games List",
            "/tournament/games",
            "tournament_games.png",
            "tournament",
        )
        .optional(),
        // profile
        CaptureFlow::new(
            "User Dashboard",
            "/profile",
            "13_dashboard_profile.png",
            "profile",
        ),
        CaptureFlow::new(
            "Game Statistics",
            "/stats",
            "14_game_statistics.png",
            "profile",
        ),
        CaptureFlow::new(
            "Match History",
            "/history",
            "15_history_matches.png",
            "profile",
        ),
        // blockchain
        CaptureFlow::new(
            "Blockchain Record",
            "/blockchain",
            "12_blockchain_record.png",
            "blockchain",
        )
        .optional(),
    ]
}

pub fn default_catalogue() -> FlowCatalogue {
    FlowCatalogue {
        flows: default_flows(),
        endpoints: default_endpoints(),
    }
}
