//! Command-line interface for the clinic dispatch engine.
//!
//! Seeds a small demo clinic, runs the demo admissions, then offers an
//! interactive menu for registering, booking, triaging, serving and undoing.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use chrono::NaiveTime;
use clinic_dispatch::{DispatchEngine, Doctor, EngineConfig, Patient};
use tracing_subscriber::EnvFilter;

const TOP_K: usize = 3;

struct ClinicCli<R> {
    engine: DispatchEngine,
    input: R,
    running: bool,
}

impl<R: BufRead> ClinicCli<R> {
    fn new(engine: DispatchEngine, input: R) -> Self {
        ClinicCli {
            engine,
            input,
            running: true,
        }
    }

    fn print_menu(&self) {
        println!("=== Hospital CLI ===");
        println!("1. Register/Update Patient");
        println!("2. Book Slot (Routine)");
        println!("3. Serve Next");
        println!("4. Emergency In (Triage)");
        println!("5. Undo");
        println!("6. Reports");
        println!("7. Exit");
    }

    /// Read one trimmed line. `None` on end of input.
    fn get_input(&mut self, prompt: &str) -> io::Result<Option<String>> {
        print!("{}: ", prompt);
        io::stdout().flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Read and parse one number. `Ok(None)` covers both end of input and
    /// unparsable text; the caller reports it.
    fn get_number<T: std::str::FromStr>(&mut self, prompt: &str) -> io::Result<Option<T>> {
        Ok(self.get_input(prompt)?.and_then(|s| s.parse().ok()))
    }

    fn register_patient(&mut self) -> io::Result<()> {
        let Some(id) = self.get_number("Patient id")? else {
            println!("Invalid input.");
            return Ok(());
        };
        let Some(name) = self.get_input("Name")? else {
            return Ok(());
        };
        let Some(age) = self.get_number("Age")? else {
            println!("Invalid input.");
            return Ok(());
        };
        let Some(severity) = self.get_number("Severity (lower => more urgent)")? else {
            println!("Invalid input.");
            return Ok(());
        };

        self.engine.register(Patient::new(id, name, age, severity));
        println!("Registered/Updated: {}", id);
        Ok(())
    }

    fn book_routine(&mut self) -> io::Result<()> {
        let Some(patient_id) = self.get_number("Patient id")? else {
            println!("Invalid input.");
            return Ok(());
        };
        let Some(doctor_id) = self.get_number("Doctor id")? else {
            println!("Invalid input.");
            return Ok(());
        };

        match self.engine.book_routine(patient_id, doctor_id) {
            Ok(token) => println!("Booked: {}", token),
            Err(e) => println!("Booking failed ({})", e),
        }
        Ok(())
    }

    fn serve_next(&mut self) {
        match self.engine.serve_next() {
            Some(token) => println!("Served: {}", token),
            None => println!("No patients to serve"),
        }
    }

    fn triage(&mut self) -> io::Result<()> {
        let Some(patient_id) = self.get_number("Patient id for triage")? else {
            println!("Invalid input.");
            return Ok(());
        };

        match self.engine.triage_insert(patient_id) {
            Ok(token) => println!("Inserted in emergency triage: {}", token),
            Err(e) => println!("Triage failed ({})", e),
        }
        Ok(())
    }

    fn reports(&self) {
        print!("{}", self.engine.summary());
        println!(
            "Top {} frequent patients: {:?}",
            TOP_K,
            self.engine.top_k_frequent_patients(TOP_K)
        );
    }

    fn run(&mut self) -> io::Result<()> {
        while self.running {
            self.print_menu();

            let Some(choice) = self.get_input("Choose")? else {
                break;
            };

            match choice.parse::<u32>() {
                Ok(1) => self.register_patient()?,
                Ok(2) => self.book_routine()?,
                Ok(3) => self.serve_next(),
                Ok(4) => self.triage()?,
                Ok(5) => println!("{}", self.engine.undo()),
                Ok(6) => self.reports(),
                Ok(7) => {
                    self.running = false;
                    println!("Bye");
                }
                _ => println!("Invalid choice"),
            }
        }
        Ok(())
    }
}

fn time(hour: u32, minute: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Two doctors and three patients.
fn seed_clinic(engine: &mut DispatchEngine) {
    let mut rao = Doctor::new(1, "Dr. Rao", "General");
    let mut mehta = Doctor::new(2, "Dr. Mehta", "Pediatrics");
    if let Some(start) = time(9, 0) {
        rao.generate_slots(101, start, 15, 3);
        mehta.generate_slots(201, start, 20, 2);
    }
    engine.add_doctor(rao);
    engine.add_doctor(mehta);

    engine.register(Patient::new(1, "Alice", 30, 5));
    engine.register(Patient::new(2, "Bob", 45, 2));
    engine.register(Patient::new(3, "Charlie", 10, 1));
}

fn run_demo(engine: &mut DispatchEngine) {
    println!("Demo: Book Alice with Dr. Rao");
    let booked = engine.book_routine(1, 1);
    println!("Book success: {}", booked.is_ok());

    println!("Demo: Emergency triage for Bob");
    if let Err(e) = engine.triage_insert(2) {
        println!("Triage failed ({})", e);
    }

    let show = |token: Option<clinic_dispatch::Token>| {
        token.map_or_else(|| "nobody".to_string(), |t| t.to_string())
    };
    println!(
        "Serve next (should serve Bob due to triage): {}",
        show(engine.serve_next())
    );
    println!("Serve next (should serve Alice): {}", show(engine.serve_next()));
    println!("{}", engine.summary());
}

fn main() -> ExitCode {
    let config = match EngineConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with_writer(io::stderr)
        .init();

    tracing::info!(
        routine_capacity = config.routine_capacity,
        "clinic-dispatch starting v{}",
        env!("CARGO_PKG_VERSION")
    );

    let mut engine = DispatchEngine::new(&config);
    seed_clinic(&mut engine);
    run_demo(&mut engine);

    let stdin = io::stdin();
    let mut cli = ClinicCli::new(engine, stdin.lock());
    match cli.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("terminal I/O failed: {e}");
            ExitCode::FAILURE
        }
    }
}
