//! Line-based terminal front-end for the library flows.

use std::io::Write;

use chrono::NaiveDate;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use dalvacation::{
    form::Value,
    services::{
        identity::IdentityProvider,
        profile::ProfileBackend,
        pubsub::ConcernMessage,
        reservation::{Reservation, ReservationForm, Stay},
        rooms::Room,
    },
    signup::{
        form::{UserRole, SECURITY_QUESTIONS},
        Command, Message, Notification, SignUpFlow, Stage, ViewMessage,
    },
    Route,
};

#[derive(Debug)]
pub enum TerminalError {
    Io(std::io::Error),
}

impl std::fmt::Display for TerminalError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "Terminal error: {}", e),
        }
    }
}

impl std::error::Error for TerminalError {}

impl From<std::io::Error> for TerminalError {
    fn from(e: std::io::Error) -> TerminalError {
        TerminalError::Io(e)
    }
}

pub struct Terminal<R, W> {
    input: R,
    output: W,
}

impl<R: AsyncBufRead + Unpin, W: Write> Terminal<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// `None` once the input is closed.
    async fn prompt(&mut self, label: &str) -> Result<Option<String>, TerminalError> {
        write!(self.output, "{}: ", label)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn say(&mut self, text: impl std::fmt::Display) -> Result<(), TerminalError> {
        writeln!(self.output, "{}", text)?;
        Ok(())
    }

    /// Drives the sign-up flow until it redirects. Returns `None` if the user
    /// closed the input first.
    pub async fn sign_up(
        &mut self,
        flow: &mut SignUpFlow,
        identity: &dyn IdentityProvider,
        backend: &dyn ProfileBackend,
    ) -> Result<Option<Route>, TerminalError> {
        loop {
            let edits = match flow.stage() {
                Stage::CollectCredentials(_) => self.credentials().await?,
                Stage::CollectSecurityQuestion { email, .. } => {
                    let email = email.clone();
                    self.security_question(&email).await?
                }
                Stage::Complete => return Ok(Some(Route::SignIn)),
            };
            let Some(edits) = edits else {
                return Ok(None);
            };
            for edit in edits {
                flow.update(Message::View(edit));
            }

            let command = flow.submit(identity, backend).await;
            self.report(flow)?;
            if let Command::Redirect(route) = command {
                return Ok(Some(route));
            }
        }
    }

    async fn credentials(&mut self) -> Result<Option<Vec<ViewMessage>>, TerminalError> {
        self.say("Sign Up")?;
        let Some(email) = self.prompt("Email").await? else {
            return Ok(None);
        };
        let Some(password) = self.prompt("Password").await? else {
            return Ok(None);
        };
        let Some(confirm) = self.prompt("Confirm Password").await? else {
            return Ok(None);
        };
        let roles = UserRole::ALL
            .iter()
            .map(|r| format!("{} ({})", r.as_str(), r.label()))
            .collect::<Vec<_>>()
            .join(", ");
        let Some(role) = self.prompt(&format!("User Role [{}]", roles)).await? else {
            return Ok(None);
        };
        Ok(Some(vec![
            ViewMessage::EmailEdited(email),
            ViewMessage::PasswordEdited(password),
            ViewMessage::ConfirmPasswordEdited(confirm),
            ViewMessage::UserRoleSelected(role.trim().to_string()),
        ]))
    }

    async fn security_question(
        &mut self,
        email: &str,
    ) -> Result<Option<Vec<ViewMessage>>, TerminalError> {
        self.say(format!("Security question for {}", email))?;
        for (i, question) in SECURITY_QUESTIONS.iter().enumerate() {
            self.say(format!("  {}. {}", i + 1, question))?;
        }
        let Some(choice) = self.prompt("Security Question").await? else {
            return Ok(None);
        };
        let Some(answer) = self.prompt("Answer").await? else {
            return Ok(None);
        };
        let question = choice
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| SECURITY_QUESTIONS.get(i))
            .map(|q| q.to_string())
            .unwrap_or(choice);
        Ok(Some(vec![
            ViewMessage::SecurityQuestionSelected(question),
            ViewMessage::SecurityAnswerEdited(answer),
        ]))
    }

    fn report(&mut self, flow: &mut SignUpFlow) -> Result<(), TerminalError> {
        let warnings: Vec<(&str, &Value<String>)> = match flow.stage() {
            Stage::CollectCredentials(form) => vec![
                ("Email", &form.email),
                ("Password", &form.password),
                ("Confirm Password", &form.confirm_password),
                ("User Role", &form.user_role),
            ],
            Stage::CollectSecurityQuestion { form, .. } => {
                vec![("Security Question", &form.question), ("Answer", &form.answer)]
            }
            Stage::Complete => Vec::new(),
        };
        let lines: Vec<String> = warnings
            .into_iter()
            .filter_map(|(label, value)| {
                value
                    .warning
                    .as_ref()
                    .map(|w| format!("  {}: {}", label, w))
            })
            .collect();
        for line in lines {
            self.say(line)?;
        }
        match flow.take_notification() {
            Some(Notification::Success(m)) => self.say(m),
            Some(Notification::Error(m)) => self.say(format!("Error: {}", m)),
            None => Ok(()),
        }
    }

    /// Asks for a non-empty value until one is given.
    async fn required(&mut self, label: &str) -> Result<Option<String>, TerminalError> {
        loop {
            let Some(value) = self.prompt(label).await? else {
                return Ok(None);
            };
            let value = value.trim();
            if !value.is_empty() {
                return Ok(Some(value.to_string()));
            }
            self.say(format!("  {} is required", label))?;
        }
    }

    /// Asks for the dates of a stay until they are valid for a booking made
    /// on `today`.
    pub async fn stay(&mut self, today: NaiveDate) -> Result<Option<Stay>, TerminalError> {
        let mut form = ReservationForm::default();
        loop {
            let Some(start) = self.prompt("Start date (YYYY-MM-DD)").await? else {
                return Ok(None);
            };
            let Some(end) = self.prompt("End date (YYYY-MM-DD)").await? else {
                return Ok(None);
            };
            form.start_date.set(start);
            form.end_date.set(end);
            match form.validate(today) {
                Ok(stay) => return Ok(Some(stay)),
                Err(errors) => form.apply(&errors),
            }
            for (label, value) in [("Start date", &form.start_date), ("End date", &form.end_date)] {
                if let Some(warning) = &value.warning {
                    self.say(format!("  {}: {}", label, warning))?;
                }
            }
        }
    }

    pub async fn concern(
        &mut self,
        customer_email: &str,
        customer_id: &str,
    ) -> Result<Option<ConcernMessage>, TerminalError> {
        let Some(booking_reference) = self.required("Booking reference").await? else {
            return Ok(None);
        };
        let Some(customer_concern) = self.required("Concern").await? else {
            return Ok(None);
        };
        Ok(Some(ConcernMessage {
            booking_reference,
            customer_concern,
            customer_email: customer_email.to_string(),
            customer_id: customer_id.to_string(),
        }))
    }

    pub fn room(&mut self, room: &Room, reservations: &[Reservation]) -> Result<(), TerminalError> {
        self.say(format!("Room #{} ({})", room.room_number, room.room_type))?;
        self.say(format!("  Tariff: {:.2}/night", room.tariff))?;
        self.say(format!("  Capacity: {} guest(s)", room.capacity))?;
        if !room.amenities.is_empty() {
            self.say(format!("  Amenities: {}", room.amenities.join(", ")))?;
        }
        if !room.description.is_empty() {
            self.say(format!("  {}", room.description))?;
        }
        if !reservations.is_empty() {
            self.say("Your reservations:")?;
            for reservation in reservations {
                self.say(format!("  {}", reservation.reservation_id))?;
            }
        }
        Ok(())
    }

    pub fn rooms(&mut self, rooms: &[Room]) -> Result<(), TerminalError> {
        if rooms.is_empty() {
            return self.say("No listing to show...!");
        }
        for room in rooms {
            self.say(format!(
                "#{:<5} {:<12} {:>8.2}/night  {} guest(s)  {}",
                room.room_number,
                room.room_type,
                room.tariff,
                room.capacity,
                room.amenities.join(", ")
            ))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dalvacation::{
        services::{
            identity::{IdentityError, SignUpRequest},
            profile::{BackendError, ConfirmIdentityRequest, SecurityProfileRequest},
        },
        session::Session,
    };
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct Identity {
        fail_first: Mutex<bool>,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl IdentityProvider for Identity {
        async fn sign_up(&self, _request: &SignUpRequest) -> Result<(), IdentityError> {
            *self.calls.lock().unwrap() += 1;
            let mut fail = self.fail_first.lock().unwrap();
            if *fail {
                *fail = false;
                return Err(IdentityError {
                    http_status: Some(400),
                    kind: None,
                    error: "An account with the given email already exists.".to_string(),
                });
            }
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct Backend {
        saved: Mutex<Vec<SecurityProfileRequest>>,
    }

    #[async_trait]
    impl ProfileBackend for Backend {
        async fn save_security_profile(
            &self,
            request: &SecurityProfileRequest,
        ) -> Result<(), BackendError> {
            self.saved.lock().unwrap().push(request.clone());
            Ok(())
        }
        async fn confirm_identity(
            &self,
            _request: &ConfirmIdentityRequest,
        ) -> Result<(), BackendError> {
            Ok(())
        }
    }

    fn flow() -> SignUpFlow {
        SignUpFlow::new(&Session::default(), "pool".to_string()).0
    }

    #[tokio::test]
    async fn full_sign_up_session() {
        let input: &[u8] = b"a@b.com\nAbcd1234!\nAbcd1234\nregular\n\
a@b.com\nAbcd1234!\nAbcd1234!\nregular\n\
3\nRex\n";
        let mut term = Terminal::new(input, Vec::new());
        let identity = Identity::default();
        let backend = Backend::default();

        let route = term.sign_up(&mut flow(), &identity, &backend).await.unwrap();

        assert_eq!(route, Some(Route::SignIn));
        assert_eq!(*identity.calls.lock().unwrap(), 1);
        let saved = backend.saved.lock().unwrap();
        assert_eq!(saved[0].question, SECURITY_QUESTIONS[2]);
        assert_eq!(saved[0].answer, "Rex");
        let output = String::from_utf8(term.into_output()).unwrap();
        assert!(output.contains("Confirm Password: Passwords don't match"));
        assert!(output.contains("Sign up successful!"));
    }

    #[tokio::test]
    async fn provider_error_is_shown_and_retried() {
        let input: &[u8] = b"a@b.com\nAbcd1234!\nAbcd1234!\nadmin0\n\
a@b.com\nAbcd1234!\nAbcd1234!\nadmin0\n";
        let mut term = Terminal::new(input, Vec::new());
        let identity = Identity {
            fail_first: Mutex::new(true),
            ..Default::default()
        };
        let mut flow = flow();

        // Input ends while on the security question.
        let route = term
            .sign_up(&mut flow, &identity, &Backend::default())
            .await
            .unwrap();

        assert_eq!(route, None);
        assert_eq!(flow.stage().number(), Some(2));
        let output = String::from_utf8(term.into_output()).unwrap();
        assert!(output.contains("Error: An account with the given email already exists."));
    }

    #[test]
    fn empty_room_listing() {
        let mut term = Terminal::new(&b""[..], Vec::new());
        term.rooms(&[]).unwrap();
        assert_eq!(
            String::from_utf8(term.into_output()).unwrap(),
            "No listing to show...!\n"
        );
    }

    #[tokio::test]
    async fn stay_is_asked_again_until_valid() {
        let input: &[u8] = b"2024-06-10\n2024-06-12\n2024-06-11\n2024-06-14\n";
        let mut term = Terminal::new(input, Vec::new());
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();

        let stay = term.stay(today).await.unwrap().unwrap();

        assert_eq!(stay.start, NaiveDate::from_ymd_opt(2024, 6, 11).unwrap());
        assert_eq!(stay.nights(), 3);
        let output = String::from_utf8(term.into_output()).unwrap();
        assert!(output.contains("Start date: Start date must be in the future"));
    }

    #[tokio::test]
    async fn stay_abandoned_when_input_closes() {
        let mut term = Terminal::new(&b"2024-06-11\n"[..], Vec::new());
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        assert_eq!(term.stay(today).await.unwrap(), None);
    }

    #[tokio::test]
    async fn concern_requires_every_field() {
        let input: &[u8] = b"\nABC123\n  The heater is broken \n";
        let mut term = Terminal::new(input, Vec::new());

        let message = term
            .concern("customer1@example.com", "CUST001")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            message,
            ConcernMessage {
                booking_reference: "ABC123".to_string(),
                customer_concern: "The heater is broken".to_string(),
                customer_email: "customer1@example.com".to_string(),
                customer_id: "CUST001".to_string(),
            }
        );
        let output = String::from_utf8(term.into_output()).unwrap();
        assert!(output.contains("Booking reference is required"));
    }

    #[test]
    fn room_details_with_reservations() {
        let room = Room {
            room_id: "r-1".to_string(),
            room_number: 101,
            room_type: "Suite".to_string(),
            tariff: 149.5,
            capacity: 3,
            amenities: vec!["Wifi".to_string()],
            description: String::new(),
            created_at: String::new(),
            updated_at: String::new(),
        };
        let reservations = [Reservation {
            reservation_id: "res-1".to_string(),
            user_id: "user-1".to_string(),
            room_id: Some("r-1".to_string()),
        }];
        let mut term = Terminal::new(&b""[..], Vec::new());
        term.room(&room, &reservations).unwrap();
        assert_eq!(
            String::from_utf8(term.into_output()).unwrap(),
            "Room #101 (Suite)\n  Tariff: 149.50/night\n  Capacity: 3 guest(s)\n  \
Amenities: Wifi\nYour reservations:\n  res-1\n"
        );
    }
}
