// Prompt for the service-backed categories (Role Alignment, Skills Match).

/// Replace `{jd_text}` and `{resume_text}` before sending.
pub const CATEGORY_ASSESSMENT_PROMPT_TEMPLATE: &str = r#"Act as a recruiter comparing a resume to a job description. Score two things:

ROLE ALIGNMENT (0-15): how closely the candidate's titles, seniority and responsibilities match the role.
SKILLS MATCH (0-15): how many of the job's technical and interpersonal skills the resume demonstrates.

Return a JSON object with this EXACT schema (no extra fields):
{"roleAlignment": 11, "skillsMatch": 9, "rationale": "One or two sentences"}

Rules:
- Both scores are whole numbers from 0 to 15.
- Judge only from the text provided; do not assume unstated experience.

JOB DESCRIPTION:
{jd_text}

RESUME:
{resume_text}"#;
