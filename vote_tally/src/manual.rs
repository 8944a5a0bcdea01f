/*!

This is the long-form manual for `vote_tally` and the `tally` command.

## Input formats

The votes and the candidates are exports of the vote store. Two formats
are supported for the votes:
* `json` a JSON array of vote records
* `csv` a CSV file with a header row

The candidates are always a JSON array.

### `json`

Each record has at least the following fields:

```text
{
  "id": "5b1c...",
  "candidate_id": "c1",
  "voted_at": "2025-04-13T14:05:00Z",
  "voter_name": "Carla Quispe",
  "voter_email": "carla@mail.pe",
  "voter_dni": "45678912",
  "voter_location": "Cusco"
}
```

`candidate_id` may be `null`. The structured location can be given with
`department`, `province` and `district` (or `departamento`, `provincia`,
`distrito`, as sent by the voting form). Timestamps are RFC 3339 and are
converted to UTC.

### `csv`

The header row names the columns, with the same names as the JSON fields.
Empty cells are treated as missing values. Extra columns are ignored.

## Results

The percentage of each candidate is computed over **all** the votes,
including the votes that do not refer to a registered candidate. Hence the
percentages add up to less than 100 when some votes are unassigned.
Percentages have 2 decimals.

The hourly histogram uses the hour of the vote in UTC. Set
`utcOffsetHours` in the output settings (for example `-5` for Lima) to
read the hours in local time. Hours without votes are not listed.

The location histogram lists the locations by decreasing number of votes.
Votes without a location are not listed under any bucket.

## Data quality

* a record is _complete_ when it has a name, a valid email and a candidate
* an email is _valid_ when it contains a `@` followed, somewhere, by a `.`
* a record is a _duplicate_ when another record has exactly the same email
  (case sensitive). All the records of the group are duplicates.
* the quality score is the share of complete records, with 1 decimal. An
  empty snapshot scores 100.

With `--issues`, every record is listed with its problems, in this order:
`missing name`, `invalid email`, `missing location`, `missing candidate`,
`duplicate`.

## Configuration file

```text
{
  "outputSettings": {
    "contestName": "Elecciones 2025",
    "contestDate": "2025-04-13",
    "outputDirectory": "out",
    "utcOffsetHours": -5
  },
  "voteSources": [
    { "provider": "json", "filePath": "votes.json" }
  ],
  "candidatesFile": "candidates.json",
  "locationsFile": "locations.json"
}
```

The paths are relative to the configuration file. `locationsFile` is
optional: the built-in table is used when it is missing.

*/
