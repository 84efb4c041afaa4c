//! Permission names checked by protected routes.

pub const VIEW_PATIENTS: &str = "ViewPatients";
pub const MANAGE_PATIENTS: &str = "ManagePatients";
pub const VIEW_APPOINTMENTS: &str = "ViewAppointments";
pub const MANAGE_APPOINTMENTS: &str = "ManageAppointments";
pub const VIEW_MEDICAL_NOTES: &str = "ViewMedicalNotes";
pub const MANAGE_MEDICAL_NOTES: &str = "ManageMedicalNotes";
pub const VIEW_SUMMARIES: &str = "ViewSummaries";
pub const GENERATE_SUMMARIES: &str = "GenerateSummaries";
pub const MANAGE_DOCTORS: &str = "ManageDoctors";
pub const MANAGE_SPECIALTIES: &str = "ManageSpecialties";
pub const MANAGE_USERS: &str = "ManageUsers";
pub const USE_AGENT: &str = "UseAgent";

/// Every permission with a short description, in seeding order.
pub const ALL: &[(&str, &str)] = &[
    (VIEW_PATIENTS, "Read patient records"),
    (MANAGE_PATIENTS, "Create, update and delete patients"),
    (VIEW_APPOINTMENTS, "Read appointments"),
    (MANAGE_APPOINTMENTS, "Create, update and delete appointments"),
    (VIEW_MEDICAL_NOTES, "Read medical notes"),
    (MANAGE_MEDICAL_NOTES, "Create, update and delete medical notes"),
    (VIEW_SUMMARIES, "Read clinical summaries"),
    (GENERATE_SUMMARIES, "Create, update and delete clinical summaries"),
    (MANAGE_DOCTORS, "Create, update and delete doctors"),
    (MANAGE_SPECIALTIES, "Create, update and delete specialties"),
    (MANAGE_USERS, "Manage users, roles and permissions"),
    (USE_AGENT, "Talk to the medical assistant agent"),
];

/// Role assigned to every self-registered user.
pub const DEFAULT_ROLE: &str = "Doctor";
pub const ADMIN_ROLE: &str = "Admin";

/// Grants given to the default doctor role.
pub const DOCTOR_GRANTS: &[&str] = &[
    VIEW_PATIENTS,
    MANAGE_PATIENTS,
    VIEW_APPOINTMENTS,
    MANAGE_APPOINTMENTS,
    VIEW_MEDICAL_NOTES,
    MANAGE_MEDICAL_NOTES,
    VIEW_SUMMARIES,
    GENERATE_SUMMARIES,
    USE_AGENT,
];
