// Classes endpoints
pub const CREATE_CLASS: &str = "/class/create";
pub const GET_ALL_CLASSES: &str = "/class/getAll";

// Auth endpoints
pub const LOGIN: &str = "/auth/login";
pub const PROFILE: &str = "/auth/profile";

// Student endpoints
pub const CREATE_STUDENT: &str = "/student/create";

// Teacher endpoints
pub const CREATE_TEACHER: &str = "/teacher/create";
pub const GET_ALL_TEACHERS: &str = "/teacher/getAllTeachers";

// Exam endpoints
pub const CREATE_EXAM: &str = "/exam/create";
pub const GET_ALL_EXAMS: &str = "/exam/getAll";

// Announcement endpoints
pub const CREATE_ANNOUNCEMENT: &str = "/announcement/create";

// Fee endpoints
pub const CREATE_FEE_PLAN: &str = "/fee/createPlan";
