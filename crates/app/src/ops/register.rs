use clap::Args;

use common::user::Registration;

use crate::op::{Acting, ContextError};

#[derive(Args, Debug, Clone)]
pub struct Register {
    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub firstname: String,

    #[arg(long)]
    pub lastname: String,

    /// Register an administrator; requires `--as` with an existing administrator
    #[arg(long, requires = "as_admin")]
    pub admin: bool,

    /// Administrator registering the new administrator; only valid with `--admin`
    #[arg(long = "as", id = "as_admin", value_name = "EMAIL", requires = "admin")]
    pub acting: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error("registration failed: {0}")]
    Lottery(#[from] service::LotteryError),
    #[error("--admin and --as must be given together")]
    ActingMismatch,
}

#[async_trait::async_trait]
impl crate::op::Op for Register {
    type Error = RegisterError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let registration = Registration::new(&self.email, &self.firstname, &self.lastname);

        let user = match (&self.acting, self.admin) {
            (Some(email), true) => {
                let acting = Acting {
                    email: email.clone(),
                };
                let (service, admin) = ctx.acting(&acting).await?;
                service.lottery().register_admin(&admin, registration).await?
            }
            (None, false) => {
                let service = ctx.service().await?;
                service.lottery().register_user(registration).await?
            }
            _ => return Err(RegisterError::ActingMismatch),
        };

        Ok(format!(
            "Registered {} {} <{}> as {} (id: {})\n - Public key: {}",
            user.firstname,
            user.lastname,
            user.email,
            user.role,
            user.id,
            user.public_key().to_hex()
        ))
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use crate::args::Args;
    use crate::Command;

    fn parse(extra: &[&str]) -> Result<Args, clap::Error> {
        let mut argv = vec![
            "lottery",
            "register",
            "--email",
            "bob@example.com",
            "--firstname",
            "Bob",
            "--lastname",
            "Smith",
        ];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv)
    }

    #[test]
    fn test_player_registration_args() {
        let args = parse(&[]).unwrap();
        let Command::Register(register) = args.command else {
            panic!("expected register command");
        };
        assert!(!register.admin);
        assert!(register.acting.is_none());
    }

    #[test]
    fn test_admin_registration_args() {
        let args = parse(&["--admin", "--as", "admin@example.com"]).unwrap();
        let Command::Register(register) = args.command else {
            panic!("expected register command");
        };
        assert!(register.admin);
        assert_eq!(register.acting.as_deref(), Some("admin@example.com"));
    }

    #[test]
    fn test_as_without_admin_rejected() {
        assert!(parse(&["--as", "admin@example.com"]).is_err());
        assert!(parse(&["--admin"]).is_err());
    }
}
